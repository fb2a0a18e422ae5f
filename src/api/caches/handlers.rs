use actix_web::{get, web, HttpResponse};
use serde_json::json;

use crate::{
    api::{LimitQuery, RqState},
    errors::AppResult,
    models::oauth_token::{OAuthToken, Provider},
    session::SessionClaims,
    sources::SourceError,
    RqDbPool,
};

fn disconnected() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "connected": false,
        "videos": []
    }))
}

#[get("/youtube")]
pub async fn get_youtube(
    pool: RqDbPool,
    state: RqState,
    query: web::Query<LimitQuery>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    // Cached videos outlive the grant; never serve them without one.
    let connected = {
        let mut conn = pool.get()?;
        OAuthToken::load(&mut conn, Provider::Google)?.is_some()
    };
    if !connected {
        return Ok(disconnected());
    }

    match state.youtube.get_limited(query.limit).await {
        Ok(videos) => Ok(HttpResponse::Ok().json(json!({
            "connected": true,
            "videos": videos
        }))),
        Err(SourceError::NotConnected(_)) | Err(SourceError::NotConfigured(_)) => {
            Ok(disconnected())
        }
        Err(e) => Err(e.into()),
    }
}

#[get("/github")]
pub async fn get_github(state: RqState, _claims: SessionClaims) -> AppResult<HttpResponse> {
    let calendar = state.github.get().await?;
    Ok(HttpResponse::Ok().json(calendar.as_ref()))
}

#[get("/cache")]
pub async fn get_cache_status(state: RqState, _claims: SessionClaims) -> HttpResponse {
    HttpResponse::Ok().json(state.cache_snapshots())
}
