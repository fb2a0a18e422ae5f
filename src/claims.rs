use std::future::{ready, Ready};

use actix_web::{error::ResponseError, http::StatusCode, web, FromRequest, HttpRequest, HttpResponse};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use derive_more::Display;
use serde_json::json;

use crate::state::AppState;

#[derive(Debug, Display)]
enum ExtensionError {
    #[display(fmt = "extension access is not configured")]
    NotConfigured,
    #[display(fmt = "invalid extension token")]
    InvalidToken,
}

impl ResponseError for ExtensionError {
    fn error_response(&self) -> HttpResponse {
        let code = match self {
            Self::NotConfigured => "NOT_CONFIGURED",
            Self::InvalidToken => "INVALID_TOKEN",
        };
        HttpResponse::build(self.status_code()).json(json!({
            "error": { "code": code, "message": self.to_string() }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Proof that the request carried the configured extension bearer token.
#[derive(Debug, Clone)]
pub struct ExtensionClaims;

impl FromRequest for ExtensionClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let bearer_auth = match BearerAuth::extract(req).into_inner() {
            Ok(auth) => auth,
            Err(err) => return ready(Err(err.into())),
        };

        let expected = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| state.config.extension_token.clone());
        let Some(expected) = expected else {
            return ready(Err(ExtensionError::NotConfigured.into()));
        };

        if !tokens_match(bearer_auth.token(), &expected) {
            tracing::warn!("Rejected extension request with a wrong token");
            return ready(Err(ExtensionError::InvalidToken.into()));
        }

        ready(Ok(ExtensionClaims))
    }
}

/// Compares without short-circuiting on the first differing byte.
fn tokens_match(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    given.len() == expected.len()
        && given
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}
