use super::types::{LoginRequest, MeResponse};
use crate::errors::{AppError, AppResult};
use crate::models::user::User;
use crate::session::{session_manager, SessionClaims};
use actix_web::{get, post, web, HttpResponse};

use crate::RqDbPool;

const MAX_PASSWORD_LENGTH: usize = 128;

#[post("/login")]
pub async fn login(pool: RqDbPool, login_req: web::Json<LoginRequest>) -> AppResult<HttpResponse> {
    if login_req.password.is_empty() || login_req.password.len() > MAX_PASSWORD_LENGTH {
        tracing::warn!(
            password_length = login_req.password.len(),
            "Login attempt with invalid password length"
        );
        return Err(AppError::InvalidCredentials);
    }

    let mut conn = pool.get()?;

    let user = match User::get_owner(&mut conn) {
        Some(user) => user,
        None => {
            tracing::warn!("Login attempt before a password was set");
            return Err(AppError::SetupRequired);
        }
    };

    let is_password_correct = user
        .check_password(&login_req.password)
        .map_err(|_| AppError::InvalidCredentials)?;

    if !is_password_correct {
        tracing::warn!(username = %user.username, "Login failed");
        return Err(AppError::InvalidCredentials);
    }

    let response =
        session_manager::create_session(&mut conn, &user).map_err(|_| AppError::InternalError)?;
    tracing::info!(user_id = user.id, username = %user.username, "User login successful");
    Ok(response)
}

#[post("/logout")]
pub async fn logout(pool: RqDbPool, claims: SessionClaims) -> AppResult<HttpResponse> {
    let mut conn = pool.get()?;
    session_manager::clear_session(&mut conn, &claims.session_id)
        .map_err(|_| AppError::InternalError)
}

#[get("/me")]
pub async fn me(claims: Option<SessionClaims>) -> HttpResponse {
    let body = match claims {
        Some(claims) => MeResponse {
            authenticated: true,
            username: Some(claims.username),
        },
        None => MeResponse {
            authenticated: false,
            username: None,
        },
    };
    HttpResponse::Ok().json(body)
}
