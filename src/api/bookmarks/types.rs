use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BookmarkCreate {
    pub url: String,
    pub title: Option<String>,
    pub favicon: Option<String>,
}
