use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    delete, get,
    http::header,
    web, HttpRequest, HttpResponse,
};
use rand::{distributions::Alphanumeric, Rng};

use super::types::{CallbackQuery, ProviderPath, StatusResponse};
use crate::{
    api::RqState,
    errors::{AppError, AppResult},
    models::{
        now_ts,
        oauth_token::{OAuthToken, Provider},
    },
    session::SessionClaims,
    sources::{oauth, SourceError},
    RqDbPool,
};

const STATE_COOKIE: &str = "oauth_state";
const STATE_LIFETIME_MINS: i64 = 10;

fn state_cookie(value: &str, max_age: Duration) -> Cookie<'static> {
    Cookie::build(STATE_COOKIE, value.to_string())
        .secure(!cfg!(debug_assertions))
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .path("/api")
        .finish()
}

fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[get("/{provider:google|spotify}/connect")]
pub async fn connect(
    state: RqState,
    path: web::Path<ProviderPath>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let provider = path.provider()?;
    let credentials = state
        .oauth_client(provider)
        .ok_or(SourceError::NotConfigured(provider.name()))?;

    let csrf = random_state();
    let location = oauth::authorize_url(provider, credentials, &csrf)?;

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .cookie(state_cookie(&csrf, Duration::minutes(STATE_LIFETIME_MINS)))
        .finish())
}

#[get("/{provider:google|spotify}/callback")]
pub async fn callback(
    req: HttpRequest,
    pool: RqDbPool,
    state: RqState,
    path: web::Path<ProviderPath>,
    query: web::Query<CallbackQuery>,
) -> AppResult<HttpResponse> {
    let provider = path.provider()?;
    if let Some(error) = &query.error {
        tracing::warn!(provider = provider.name(), error = %error, "Authorization was declined");
        return Err(AppError::invalid_input("code", "Authorization was declined"));
    }

    let expected = req.cookie(STATE_COOKIE).map(|cookie| cookie.value().to_string());
    match (&expected, &query.state) {
        (Some(expected), Some(given)) if !expected.is_empty() && expected == given => {}
        _ => return Err(AppError::invalid_input("state", "State mismatch")),
    }
    let code = query
        .code
        .as_deref()
        .ok_or_else(|| AppError::invalid_input("code", "Missing authorization code"))?;

    let endpoint = state
        .token_endpoint(provider)
        .ok_or(SourceError::NotConfigured(provider.name()))?;
    let grant = endpoint.exchange_code(code).await?;

    {
        let mut conn = pool.get()?;
        OAuthToken::store(&mut conn, provider, grant.as_update(now_ts()))?;
    }
    tracing::info!(provider = provider.name(), "Provider connected");

    if provider == Provider::Google {
        state.youtube.revalidate();
    }

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(state_cookie("", Duration::ZERO))
        .finish())
}

#[get("/{provider:google|spotify}/status")]
pub async fn status(
    pool: RqDbPool,
    state: RqState,
    path: web::Path<ProviderPath>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let provider = path.provider()?;
    let mut conn = pool.get()?;
    let connected = OAuthToken::load(&mut conn, provider)?.is_some();

    Ok(HttpResponse::Ok().json(StatusResponse {
        configured: state.oauth_client(provider).is_some(),
        connected,
    }))
}

#[delete("/{provider:google|spotify}")]
pub async fn disconnect(
    pool: RqDbPool,
    state: RqState,
    path: web::Path<ProviderPath>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let provider = path.provider()?;
    let mut conn = pool.get()?;
    OAuthToken::delete(&mut conn, provider)?;
    if provider == Provider::Google {
        state.youtube.clear();
    }
    tracing::info!(provider = provider.name(), "Provider disconnected");

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_state() {
        let first = random_state();
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, random_state());
    }
}
