//! Stored OAuth grants. The dashboard has one user, so each provider table
//! holds at most one row.

use diesel::prelude::*;
use serde::Serialize;

use super::now_ts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Google,
    Spotify,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Spotify => "spotify",
        }
    }

    pub fn from_name(name: &str) -> Option<Provider> {
        match name {
            "google" => Some(Provider::Google),
            "spotify" => Some(Provider::Spotify),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Queryable)]
pub struct OAuthToken {
    pub id: i32,
    pub access_token: String,
    pub refresh_token: String,
    /// unix seconds
    pub expires_at: i64,
    pub scope: Option<String>,
    pub updated_at: i64,
}

/// New token material from a code exchange or a refresh. Providers may omit
/// the refresh token on refresh, in which case the stored one is kept.
#[derive(Debug, Clone, Copy)]
pub struct TokenUpdate<'a> {
    pub access_token: &'a str,
    pub refresh_token: Option<&'a str>,
    pub expires_at: i64,
    pub scope: Option<&'a str>,
}

// Both provider tables have identical columns.
macro_rules! with_token_table {
    ($provider:expr, |$t:ident| $body:expr) => {
        match $provider {
            Provider::Google => {
                use crate::schema::google_tokens as $t;
                $body
            }
            Provider::Spotify => {
                use crate::schema::spotify_tokens as $t;
                $body
            }
        }
    };
}

impl OAuthToken {
    pub fn load(conn: &mut SqliteConnection, provider: Provider) -> QueryResult<Option<OAuthToken>> {
        with_token_table!(provider, |t| t::table
            .order(t::id.asc())
            .first::<OAuthToken>(conn)
            .optional())
    }

    pub fn store(
        conn: &mut SqliteConnection,
        provider: Provider,
        update: TokenUpdate,
    ) -> QueryResult<OAuthToken> {
        let now = now_ts();
        with_token_table!(provider, |t| conn.transaction(|conn| {
            let existing: Option<i32> = t::table
                .select(t::id)
                .order(t::id.asc())
                .first(conn)
                .optional()?;
            match existing {
                Some(row_id) => {
                    diesel::update(t::table.find(row_id))
                        .set((
                            t::access_token.eq(update.access_token),
                            t::expires_at.eq(update.expires_at),
                            t::updated_at.eq(now),
                        ))
                        .execute(conn)?;
                    if let Some(refresh_token) = update.refresh_token {
                        diesel::update(t::table.find(row_id))
                            .set(t::refresh_token.eq(refresh_token))
                            .execute(conn)?;
                    }
                    if let Some(scope) = update.scope {
                        diesel::update(t::table.find(row_id))
                            .set(t::scope.eq(scope))
                            .execute(conn)?;
                    }
                    t::table.find(row_id).first::<OAuthToken>(conn)
                }
                None => {
                    diesel::insert_into(t::table)
                        .values((
                            t::access_token.eq(update.access_token),
                            t::refresh_token.eq(update.refresh_token.unwrap_or_default()),
                            t::expires_at.eq(update.expires_at),
                            t::scope.eq(update.scope),
                            t::updated_at.eq(now),
                        ))
                        .get_result::<OAuthToken>(conn)
                }
            }
        }))
    }

    pub fn delete(conn: &mut SqliteConnection, provider: Provider) -> QueryResult<bool> {
        with_token_table!(provider, |t| diesel::delete(t::table)
            .execute(conn)
            .map(|deleted| deleted > 0))
    }
}
