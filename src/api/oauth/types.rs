use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::models::oauth_token::Provider;

#[derive(Debug, Deserialize)]
pub struct ProviderPath {
    pub provider: String,
}

impl ProviderPath {
    pub fn provider(&self) -> AppResult<Provider> {
        Provider::from_name(&self.provider)
            .ok_or_else(|| AppError::invalid_input("provider", "Unknown provider"))
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub configured: bool,
    pub connected: bool,
}
