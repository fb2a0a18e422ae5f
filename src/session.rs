use std::future::{ready, Ready};

use crate::models::{session::Session, user::User};
use crate::RqDbPool;
use actix_web::{
    dev::Payload, error::ResponseError, http::StatusCode, FromRequest, HttpRequest, HttpResponse,
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const SESSION_COOKIE: &str = "session_id";

#[derive(Debug, Display)]
pub enum SessionError {
    #[display(fmt = "no_session_cookie")]
    NoSessionCookie,
    #[display(fmt = "invalid_session")]
    InvalidSession,
    #[display(fmt = "database_error")]
    DatabaseError,
}

impl ResponseError for SessionError {
    fn error_response(&self) -> HttpResponse {
        match self {
            Self::NoSessionCookie | Self::InvalidSession => {
                HttpResponse::Unauthorized().json(json!({
                    "error": {
                        "code": "NOT_AUTHENTICATED",
                        "message": "Please log in"
                    }
                }))
            }
            Self::DatabaseError => HttpResponse::InternalServerError().json(json!({
                "error": {
                    "code": "DATABASE_ERROR",
                    "message": "Internal server error"
                }
            })),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NoSessionCookie | Self::InvalidSession => StatusCode::UNAUTHORIZED,
            Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The authenticated owner behind a request's session cookie.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SessionClaims {
    pub sub: i32,
    pub username: String,
    #[serde(skip)]
    pub session_id: String,
}

impl FromRequest for SessionClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_for(req).map_err(Into::into))
    }
}

fn claims_for(req: &HttpRequest) -> Result<SessionClaims, SessionError> {
    let pool = match req.app_data::<RqDbPool>() {
        Some(pool) => pool.get_ref().clone(),
        None => {
            log::error!("Failed to get database pool from app data");
            return Err(SessionError::DatabaseError);
        }
    };

    let session_id = match extract_session_cookie(req) {
        Some(id) => id,
        None => {
            log::debug!("No session cookie found");
            return Err(SessionError::NoSessionCookie);
        }
    };

    let mut conn = pool.get().map_err(|_| SessionError::DatabaseError)?;

    let session = match Session::get_valid(&mut conn, &session_id) {
        Some(session) => session,
        None => {
            log::debug!("Invalid or expired session");
            return Err(SessionError::InvalidSession);
        }
    };

    let user = User::get_by_id(&mut conn, session.user_id).ok_or(SessionError::InvalidSession)?;

    if session.touch(&mut conn).is_err() {
        log::warn!("Failed to update session last_accessed time");
    }

    Ok(SessionClaims {
        sub: user.id,
        username: user.username,
        session_id: session.session_id,
    })
}

fn extract_session_cookie(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// Session management functions
pub mod session_manager {
    use super::*;
    use crate::models::session::SESSION_LIFETIME_SECS;
    use actix_web::cookie::{time::Duration, Cookie, SameSite};
    use diesel::SqliteConnection;

    fn session_cookie(value: &str, max_age: Duration) -> Cookie<'static> {
        // Use secure cookies in production, but not in development (localhost)
        let is_production = !cfg!(debug_assertions);
        Cookie::build(SESSION_COOKIE, value.to_string())
            .secure(is_production)
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(max_age)
            .path("/")
            .finish()
    }

    /// Create a new session and set the session cookie
    pub fn create_session(
        conn: &mut SqliteConnection,
        user: &User,
    ) -> Result<HttpResponse, SessionError> {
        let session = Session::create(conn, user.id).map_err(|_| SessionError::DatabaseError)?;

        Ok(HttpResponse::Ok()
            .cookie(session_cookie(
                &session.session_id,
                Duration::seconds(SESSION_LIFETIME_SECS),
            ))
            .json(json!({
                "authenticated": true,
                "username": user.username
            })))
    }

    /// Clear session and remove session cookie
    pub fn clear_session(
        conn: &mut SqliteConnection,
        session_id: &str,
    ) -> Result<HttpResponse, SessionError> {
        Session::delete(conn, session_id).map_err(|_| SessionError::DatabaseError)?;

        Ok(HttpResponse::Ok()
            .cookie(session_cookie("", Duration::ZERO))
            .json(json!({
                "authenticated": false
            })))
    }

    pub fn cleanup_expired_sessions(conn: &mut SqliteConnection) -> Result<usize, SessionError> {
        Session::cleanup_expired(conn).map_err(|_| SessionError::DatabaseError)
    }
}
