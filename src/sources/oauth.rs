//! OAuth 2.0 authorization-code and refresh-token flows for Google and
//! Spotify.
//!
//! Only one grant per provider is stored. [`access_token`] is the single entry
//! point the other clients use: it hands back a usable bearer token or `None`
//! when the provider should be shown as disconnected.

use base64::{engine::general_purpose::STANDARD, Engine};
use futures_util::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;

use super::{http::ensure_success, SourceError};
use crate::config::OAuthClient;
use crate::models::oauth_token::{OAuthToken, Provider, TokenUpdate};
use crate::DbPool;

/// Tokens are refreshed this long before they actually expire.
pub const EXPIRY_BUFFER_SECS: i64 = 60;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_SCOPES: &str = "https://www.googleapis.com/auth/calendar.readonly https://www.googleapis.com/auth/tasks https://www.googleapis.com/auth/youtube.readonly";

const SPOTIFY_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SPOTIFY_SCOPES: &str =
    "user-read-currently-playing user-read-playback-state user-modify-playback-state";

/// Token material returned by a provider's token endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub scope: Option<String>,
}

impl TokenGrant {
    pub fn as_update(&self, now: i64) -> TokenUpdate<'_> {
        TokenUpdate {
            access_token: &self.access_token,
            refresh_token: self.refresh_token.as_deref(),
            expires_at: now + self.expires_in,
            scope: self.scope.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    scope: Option<String>,
}

impl From<TokenResponse> for TokenGrant {
    fn from(response: TokenResponse) -> Self {
        TokenGrant {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            // Both providers issue one-hour tokens.
            expires_in: response.expires_in.unwrap_or(3600),
            scope: response.scope,
        }
    }
}

/// A provider's token endpoint, as seen by the refresh routine.
pub trait TokenEndpoint: Send + Sync {
    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, Result<TokenGrant, SourceError>>;
}

pub struct HttpTokenEndpoint {
    client: Client,
    provider: Provider,
    credentials: OAuthClient,
}

impl HttpTokenEndpoint {
    pub fn new(client: Client, provider: Provider, credentials: OAuthClient) -> Self {
        Self {
            client,
            provider,
            credentials,
        }
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, SourceError> {
        self.post_form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
        ])
        .await
    }

    async fn post_form(&self, form: &[(&str, &str)]) -> Result<TokenGrant, SourceError> {
        let request = match self.provider {
            Provider::Google => {
                let mut fields = form.to_vec();
                fields.push(("client_id", self.credentials.client_id.as_str()));
                fields.push(("client_secret", self.credentials.client_secret.as_str()));
                self.client.post(GOOGLE_TOKEN_URL).form(&fields)
            }
            Provider::Spotify => {
                let basic = STANDARD.encode(format!(
                    "{}:{}",
                    self.credentials.client_id, self.credentials.client_secret
                ));
                self.client
                    .post(SPOTIFY_TOKEN_URL)
                    .header(reqwest::header::AUTHORIZATION, format!("Basic {basic}"))
                    .form(form)
            }
        };

        let response = ensure_success(request.send().await?)?;
        let body: TokenResponse = response.json().await?;
        Ok(body.into())
    }
}

impl TokenEndpoint for HttpTokenEndpoint {
    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, Result<TokenGrant, SourceError>> {
        Box::pin(async move {
            let form = [
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ];
            self.post_form(&form).await
        })
    }
}

/// Consent page URL for the authorization-code flow.
pub fn authorize_url(
    provider: Provider,
    credentials: &OAuthClient,
    state: &str,
) -> Result<String, SourceError> {
    let mut params = vec![
        ("client_id", credentials.client_id.as_str()),
        ("redirect_uri", credentials.redirect_uri.as_str()),
        ("response_type", "code"),
        ("state", state),
    ];
    let base = match provider {
        Provider::Google => {
            params.extend([
                ("scope", GOOGLE_SCOPES),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ]);
            GOOGLE_AUTHORIZE_URL
        }
        Provider::Spotify => {
            params.push(("scope", SPOTIFY_SCOPES));
            SPOTIFY_AUTHORIZE_URL
        }
    };

    url::Url::parse_with_params(base, &params)
        .map(String::from)
        .map_err(|e| SourceError::Parse(e.to_string()))
}

/// A bearer token for `provider` that is valid for at least another minute,
/// refreshing the stored grant first when needed. `None` means "not
/// connected": either nothing is stored or the refresh failed.
pub async fn access_token(
    pool: &DbPool,
    provider: Provider,
    endpoint: &dyn TokenEndpoint,
    now: i64,
) -> Option<String> {
    let stored = {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                log::error!("No database connection for {} token: {e}", provider.name());
                return None;
            }
        };
        match OAuthToken::load(&mut conn, provider) {
            Ok(token) => token?,
            Err(e) => {
                log::error!("Failed to load {} token: {e}", provider.name());
                return None;
            }
        }
    };

    if stored.expires_at - EXPIRY_BUFFER_SECS > now {
        return Some(stored.access_token);
    }

    let grant = match endpoint.refresh(&stored.refresh_token).await {
        Ok(grant) => grant,
        Err(e) => {
            tracing::warn!(provider = provider.name(), error = %e, "Token refresh failed");
            return None;
        }
    };

    let mut conn = pool.get().ok()?;
    match OAuthToken::store(&mut conn, provider, grant.as_update(now)) {
        Ok(token) => {
            tracing::info!(
                provider = provider.name(),
                expires_at = token.expires_at,
                "Access token refreshed"
            );
            Some(token.access_token)
        }
        Err(e) => {
            log::error!("Failed to store refreshed {} token: {e}", provider.name());
            None
        }
    }
}
