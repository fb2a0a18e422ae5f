use serde::{Deserialize, Serialize};

use crate::sources::{google::CalendarEvent, spotify::NowPlaying};

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub connected: bool,
    pub events: Vec<CalendarEvent>,
}

#[derive(Debug, Serialize)]
pub struct NowPlayingResponse {
    pub connected: bool,
    #[serde(flatten)]
    pub now_playing: NowPlaying,
}

#[derive(Debug, Deserialize)]
pub struct PlayerPath {
    pub action: String,
}
