//! Clients for the third-party services the dashboard aggregates.
//!
//! Every client converts upstream responses into typed records at the
//! boundary. Failures are reported as [`SourceError`], which is `Clone` so it
//! can be shared between the callers of a single in-flight cache refresh.

pub mod github;
pub mod google;
pub mod http;
pub mod oauth;
pub mod spotify;
pub mod weather;
pub mod youtube;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("request timed out")]
    Timeout,
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("unexpected response shape: {0}")]
    Parse(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("{0} is not connected")]
    NotConnected(&'static str),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("loader panicked: {0}")]
    Panicked(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            SourceError::Status(status.as_u16())
        } else {
            SourceError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(err.to_string())
    }
}

impl From<diesel::result::Error> for SourceError {
    fn from(err: diesel::result::Error) -> Self {
        SourceError::Database(err.to_string())
    }
}

impl From<r2d2::Error> for SourceError {
    fn from(err: r2d2::Error) -> Self {
        SourceError::Database(err.to_string())
    }
}
