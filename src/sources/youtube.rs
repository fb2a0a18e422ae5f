//! YouTube subscriptions and channel uploads.
//!
//! The Data API is only used to list subscribed channels; uploads come from
//! the public per-channel Atom feeds, which cost no API quota.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{http::ensure_success, SourceError};
use crate::feeds::{self, ParsedArticle};

const SUBSCRIPTIONS_URL: &str = "https://www.googleapis.com/youtube/v3/subscriptions";
const CHANNEL_FEED_URL: &str = "https://www.youtube.com/feeds/videos.xml";

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub link: String,
    pub channel_id: String,
    pub channel_title: String,
    pub thumbnail: String,
    pub published_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionPage {
    #[serde(default)]
    items: Vec<SubscriptionItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItem {
    snippet: SubscriptionSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionSnippet {
    title: String,
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    channel_id: Option<String>,
}

pub async fn list_subscriptions(client: &Client, token: &str) -> Result<Vec<Channel>, SourceError> {
    let mut channels = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut query = vec![
            ("part", "snippet".to_string()),
            ("mine", "true".to_string()),
            ("maxResults", "50".to_string()),
        ];
        if let Some(page) = page_token.take() {
            query.push(("pageToken", page));
        }

        let response = client
            .get(SUBSCRIPTIONS_URL)
            .bearer_auth(token)
            .query(&query)
            .send()
            .await?;
        let page: SubscriptionPage = ensure_success(response)?.json().await?;

        channels.extend(page.items.into_iter().filter_map(|item| {
            Some(Channel {
                id: item.snippet.resource_id.channel_id?,
                title: item.snippet.title,
            })
        }));

        match page.next_page_token {
            Some(next) => page_token = Some(next),
            None => break,
        }
    }

    Ok(channels)
}

/// Latest uploads of one channel, from its Atom feed.
pub async fn channel_videos(client: &Client, channel: &Channel) -> Result<Vec<Video>, SourceError> {
    let url = format!("{CHANNEL_FEED_URL}?channel_id={}", channel.id);
    let entries = feeds::fetch_articles(client, &url).await?;
    Ok(entries
        .iter()
        .filter_map(|entry| video_from_entry(channel, entry))
        .collect())
}

/// A video is a short when `/shorts/{id}` answers 200 instead of redirecting
/// to the regular watch page. Needs a client that does not follow redirects.
pub async fn is_short(no_redirect_client: &Client, video_id: &str) -> bool {
    let url = format!("https://www.youtube.com/shorts/{video_id}");
    match no_redirect_client.head(&url).send().await {
        Ok(response) => response.status() == StatusCode::OK,
        Err(e) => {
            log::debug!("Shorts check failed for {video_id}: {e}");
            false
        }
    }
}

fn video_from_entry(channel: &Channel, entry: &ParsedArticle) -> Option<Video> {
    let id = video_id(entry)?;
    if entry.title.is_empty() {
        return None;
    }
    Some(Video {
        thumbnail: format!("https://i.ytimg.com/vi/{id}/mqdefault.jpg"),
        link: if entry.link.is_empty() {
            format!("https://www.youtube.com/watch?v={id}")
        } else {
            entry.link.clone()
        },
        title: entry.title.clone(),
        channel_id: channel.id.clone(),
        channel_title: entry.author.clone().unwrap_or_else(|| channel.title.clone()),
        published_at: entry.published_timestamp(),
        id,
    })
}

fn video_id(entry: &ParsedArticle) -> Option<String> {
    if let Some(id) = entry.guid.strip_prefix("yt:video:") {
        return Some(id.to_string()).filter(|id| !id.is_empty());
    }
    url::Url::parse(&entry.link)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
}
