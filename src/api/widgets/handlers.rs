use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;

use super::types::{CalendarResponse, NowPlayingResponse, PlayerPath};
use crate::{
    api::RqState,
    errors::{AppError, AppResult},
    models::{now_ts, oauth_token::Provider},
    session::SessionClaims,
    sources::{
        google, oauth,
        spotify::{self, NowPlaying, PlayerAction},
        weather, SourceError,
    },
    RqDbPool,
};

/// Bearer token for a connected provider, `None` when it is not configured
/// or not connected.
pub async fn provider_token(pool: &RqDbPool, state: &RqState, provider: Provider) -> Option<String> {
    let endpoint = state.token_endpoint(provider)?;
    oauth::access_token(pool.get_ref(), provider, endpoint.as_ref(), now_ts()).await
}

#[get("/weather")]
pub async fn get_weather(state: RqState, _claims: SessionClaims) -> AppResult<HttpResponse> {
    let forecast = weather::fetch_forecast(&state.client, state.config.weather).await?;
    Ok(HttpResponse::Ok().json(forecast))
}

#[get("/calendar")]
pub async fn get_calendar(
    pool: RqDbPool,
    state: RqState,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let Some(token) = provider_token(&pool, &state, Provider::Google).await else {
        return Ok(HttpResponse::Ok().json(CalendarResponse {
            connected: false,
            events: Vec::new(),
        }));
    };

    let events = google::upcoming_events(&state.client, &token, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(CalendarResponse {
        connected: true,
        events,
    }))
}

#[get("/spotify/now-playing")]
pub async fn get_now_playing(
    pool: RqDbPool,
    state: RqState,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let Some(token) = provider_token(&pool, &state, Provider::Spotify).await else {
        return Ok(HttpResponse::Ok().json(NowPlayingResponse {
            connected: false,
            now_playing: NowPlaying::nothing(),
        }));
    };

    let now_playing = spotify::now_playing(&state.client, &token).await?;
    Ok(HttpResponse::Ok().json(NowPlayingResponse {
        connected: true,
        now_playing,
    }))
}

#[post("/spotify/{action:play|pause|next|previous}")]
pub async fn control_player(
    pool: RqDbPool,
    state: RqState,
    path: web::Path<PlayerPath>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let action = PlayerAction::from_name(&path.action)
        .ok_or_else(|| AppError::invalid_input("action", "Unknown player action"))?;
    let token = provider_token(&pool, &state, Provider::Spotify)
        .await
        .ok_or(SourceError::NotConnected("Spotify"))?;

    spotify::control(&state.client, &token, action).await?;
    tracing::debug!(action = %path.action, "Spotify player command sent");

    Ok(HttpResponse::NoContent().finish())
}
