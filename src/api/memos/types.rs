use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct MemoCreate {
    pub content: String,
    #[serde(default)]
    pub pinned: bool,
}
