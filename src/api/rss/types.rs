use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
pub struct FeedCreate {
    pub url: String,
    pub title: Option<String>,
    pub category_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedUpdate {
    pub title: Option<String>,
    /// Absent leaves the category alone, `null` detaches the feed.
    #[serde(default, deserialize_with = "present")]
    pub category_id: Option<Option<i32>>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
