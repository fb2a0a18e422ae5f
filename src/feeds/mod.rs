pub mod parser;

use reqwest::Client;

use crate::sources::{http, SourceError};
pub use parser::{discover_title, parse_feed, ParsedArticle};

/// Download a feed and normalize its entries.
pub async fn fetch_articles(client: &Client, url: &str) -> Result<Vec<ParsedArticle>, SourceError> {
    let body = http::fetch_text(client, url).await?;
    Ok(parse_feed(&body))
}
