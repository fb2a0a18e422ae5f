use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{http::ensure_success, SourceError};

const API_BASE: &str = "https://api.spotify.com/v1/me/player";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NowPlaying {
    pub playing: bool,
    #[serde(flatten)]
    pub track: Option<Track>,
}

impl NowPlaying {
    pub fn nothing() -> Self {
        Self {
            playing: false,
            track: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub title: String,
    pub artists: String,
    pub album: String,
    pub album_art: Option<String>,
    pub url: Option<String>,
    pub progress_ms: u64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Play,
    Pause,
    Next,
    Previous,
}

impl PlayerAction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "play" => Some(PlayerAction::Play),
            "pause" => Some(PlayerAction::Pause),
            "next" => Some(PlayerAction::Next),
            "previous" => Some(PlayerAction::Previous),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    is_playing: bool,
    progress_ms: Option<u64>,
    item: Option<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    name: String,
    duration_ms: u64,
    #[serde(default)]
    artists: Vec<Named>,
    album: Option<Album>,
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Album {
    name: String,
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

pub async fn now_playing(client: &Client, token: &str) -> Result<NowPlaying, SourceError> {
    let response = client
        .get(format!("{API_BASE}/currently-playing"))
        .bearer_auth(token)
        .send()
        .await?;

    if response.status() == StatusCode::NO_CONTENT {
        return Ok(NowPlaying::nothing());
    }

    let body: CurrentlyPlaying = ensure_success(response)?.json().await?;
    Ok(body.into())
}

pub async fn control(client: &Client, token: &str, action: PlayerAction) -> Result<(), SourceError> {
    let request = match action {
        PlayerAction::Play => client.put(format!("{API_BASE}/play")),
        PlayerAction::Pause => client.put(format!("{API_BASE}/pause")),
        PlayerAction::Next => client.post(format!("{API_BASE}/next")),
        PlayerAction::Previous => client.post(format!("{API_BASE}/previous")),
    };

    let response = request
        .bearer_auth(token)
        .header(reqwest::header::CONTENT_LENGTH, "0")
        .send()
        .await?;
    ensure_success(response).map(|_| ())
}

impl From<CurrentlyPlaying> for NowPlaying {
    fn from(current: CurrentlyPlaying) -> Self {
        // Ads and some podcasts come without an item.
        let Some(item) = current.item else {
            return NowPlaying::nothing();
        };

        let artists = item
            .artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let (album, album_art) = match item.album {
            Some(album) => {
                let art = album.images.into_iter().next().map(|image| image.url);
                (album.name, art)
            }
            None => (String::new(), None),
        };

        NowPlaying {
            playing: current.is_playing,
            track: Some(Track {
                title: item.name,
                artists,
                album,
                album_art,
                url: item.external_urls.and_then(|urls| urls.spotify),
                progress_ms: current.progress_ms.unwrap_or(0),
                duration_ms: item.duration_ms,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currently_playing_conversion() {
        let body = r#"{
          "is_playing": true,
          "progress_ms": 42000,
          "currently_playing_type": "track",
          "item": {
            "name": "Song",
            "duration_ms": 180000,
            "artists": [{"name": "A"}, {"name": "B"}],
            "album": {"name": "Album", "images": [{"url": "https://i.scdn.co/image/large", "height": 640, "width": 640}]},
            "external_urls": {"spotify": "https://open.spotify.com/track/1"}
          }
        }"#;

        let current: CurrentlyPlaying = serde_json::from_str(body).unwrap();
        let now = NowPlaying::from(current);
        let track = now.track.clone().unwrap();

        assert!(now.playing);
        assert_eq!(track.artists, "A, B");
        assert_eq!(track.album_art.as_deref(), Some("https://i.scdn.co/image/large"));
        assert_eq!(track.progress_ms, 42000);

        let json = serde_json::to_value(&now).unwrap();
        assert_eq!(json["title"], "Song");
        assert_eq!(json["playing"], true);
    }

    #[test]
    fn test_missing_item_is_nothing_playing() {
        let current: CurrentlyPlaying =
            serde_json::from_str(r#"{"is_playing": true, "progress_ms": null, "item": null}"#).unwrap();
        let now = NowPlaying::from(current);

        assert_eq!(now, NowPlaying::nothing());
        assert_eq!(serde_json::to_value(&now).unwrap(), serde_json::json!({"playing": false}));
    }

    #[test]
    fn test_player_action_names() {
        assert_eq!(PlayerAction::from_name("next"), Some(PlayerAction::Next));
        assert_eq!(PlayerAction::from_name("shuffle"), None);
    }
}
