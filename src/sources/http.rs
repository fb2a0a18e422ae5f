use std::time::Duration;

use reqwest::{Client, Response};

use super::SourceError;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const USER_AGENT: &str = concat!("homepage/", env!("CARGO_PKG_VERSION"));

// See: https://stackoverflow.com/a/7001617/5155484
pub const FEED_ACCEPT: &str = "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.8";

/// Shared outbound client. Every upstream call goes through one of these so
/// that a slow source is cut off by the timeout instead of holding a batch.
pub fn build_client() -> Result<Client, SourceError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(SourceError::from)
}

/// Client that reports redirects instead of following them.
pub fn build_no_redirect_client() -> Result<Client, SourceError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(SourceError::from)
}

pub fn ensure_success(response: Response) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SourceError::Status(status.as_u16()))
    }
}

/// GET a feed document as text.
pub async fn fetch_text(client: &Client, url: &str) -> Result<String, SourceError> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, FEED_ACCEPT)
        .send()
        .await?;
    let body = ensure_success(response)?.text().await?;
    Ok(body)
}
