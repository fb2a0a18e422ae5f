use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use diesel::r2d2;
use serde_json::json;
use std::fmt;

use crate::sources::SourceError;

/// Application-wide error types with user-friendly messages
#[derive(Debug)]
pub enum AppError {
    // Authentication
    InvalidCredentials,
    NotAuthenticated,
    SetupRequired,

    // Validation Errors
    InvalidInput { field: String, message: String },
    DuplicateResource { resource: String },
    ResourceNotFound { resource: String },

    // Feed-related Errors
    FeedUnreachable,
    FeedParseError,

    // Database Errors
    DatabaseError,
    ConnectionPoolError,

    // External Service Errors
    NetworkError,
    UpstreamError,
    ServiceUnavailable { service: String },

    // System Errors
    InternalError,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidCredentials => write!(f, "Invalid password"),
            AppError::NotAuthenticated => write!(f, "Please log in"),
            AppError::SetupRequired => write!(f, "No password set - run with --set-password first"),

            AppError::InvalidInput { field, message } => write!(f, "Invalid {}: {}", field, message),
            AppError::DuplicateResource { resource } => write!(f, "{} already exists", resource),
            AppError::ResourceNotFound { resource } => write!(f, "{} not found", resource),

            AppError::FeedUnreachable => write!(f, "Feed could not be downloaded"),
            AppError::FeedParseError => write!(f, "Unable to parse feed - invalid format"),

            AppError::DatabaseError => write!(f, "A database error occurred - please try again"),
            AppError::ConnectionPoolError => write!(f, "Service temporarily unavailable - please try again"),

            AppError::NetworkError => write!(f, "Upstream service did not respond"),
            AppError::UpstreamError => write!(f, "Upstream service returned an unexpected response"),
            AppError::ServiceUnavailable { service } => write!(f, "{} is not available", service),

            AppError::InternalError => write!(f, "An unexpected error occurred - please try again"),
        }
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AppError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "NOT_AUTHENTICATED"),
            AppError::SetupRequired => (StatusCode::CONFLICT, "SETUP_REQUIRED"),

            AppError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::DuplicateResource { .. } => (StatusCode::CONFLICT, "DUPLICATE_RESOURCE"),
            AppError::ResourceNotFound { .. } => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"),

            AppError::FeedUnreachable => (StatusCode::BAD_REQUEST, "FEED_UNREACHABLE"),
            AppError::FeedParseError => (StatusCode::BAD_REQUEST, "FEED_PARSE_ERROR"),

            AppError::DatabaseError => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::ConnectionPoolError => (StatusCode::INTERNAL_SERVER_ERROR, "CONNECTION_POOL_ERROR"),

            AppError::NetworkError => (StatusCode::BAD_GATEWAY, "NETWORK_ERROR"),
            AppError::UpstreamError => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            AppError::ServiceUnavailable { .. } => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),

            AppError::InternalError => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    pub fn invalid_input(field: &str, message: &str) -> Self {
        AppError::InvalidInput {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn duplicate_resource(resource: &str) -> Self {
        AppError::DuplicateResource {
            resource: resource.to_string(),
        }
    }

    pub fn resource_not_found(resource: &str) -> Self {
        AppError::ResourceNotFound {
            resource: resource.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, error_code) = self.parts();

        if status.is_server_error() {
            tracing::error!(code = error_code, "Server error: {:?}", self);
        } else {
            tracing::info!(code = error_code, "Client error: {:?}", self);
        }

        HttpResponse::build(status).json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string()
            }
        }))
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl From<r2d2::PoolError> for AppError {
    fn from(err: r2d2::PoolError) -> Self {
        log::error!("Database connection pool error: {}", err);
        AppError::ConnectionPoolError
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        match err {
            DieselError::NotFound => AppError::resource_not_found("Record"),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                AppError::duplicate_resource("Record")
            }
            _ => {
                log::error!("Database error: {}", err);
                AppError::DatabaseError
            }
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::from(SourceError::from(err))
    }
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        log::warn!("Upstream error: {}", err);
        match err {
            SourceError::Http(_) | SourceError::Timeout => AppError::NetworkError,
            SourceError::Status(_) | SourceError::Parse(_) => AppError::UpstreamError,
            SourceError::Database(_) => AppError::DatabaseError,
            SourceError::Panicked(_) => AppError::InternalError,
            SourceError::NotConnected(service) | SourceError::NotConfigured(service) => {
                AppError::ServiceUnavailable {
                    service: service.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_rt::test]
    async fn test_error_body_shape() {
        let response = AppError::invalid_input("url", "must be http(s)").error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert_eq!(body["error"]["message"], "Invalid url: must be http(s)");
    }

    #[test]
    fn test_source_errors_map_to_gateway_statuses() {
        assert_eq!(AppError::from(SourceError::Timeout).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::from(SourceError::Status(500)).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::from(SourceError::NotConfigured("GitHub")).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = AppError::from(diesel::result::Error::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
