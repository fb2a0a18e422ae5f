use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use reqwest::Client;

use super::BATCH_SIZE;
use crate::models::{now_ts, oauth_token::Provider};
use crate::sources::{
    oauth::{self, TokenEndpoint},
    youtube::{self, Video},
    SourceError,
};
use crate::DbPool;

/// Newest uploads considered per refresh; shorts are dropped from these.
pub const CANDIDATE_LIMIT: usize = 60;

pub struct YoutubeSources {
    pub pool: DbPool,
    pub client: Client,
    pub no_redirect_client: Client,
    pub google: Option<Arc<dyn TokenEndpoint>>,
}

pub async fn load_videos(sources: Arc<YoutubeSources>) -> Result<Vec<Video>, SourceError> {
    let started = Instant::now();
    let endpoint = sources
        .google
        .as_ref()
        .ok_or(SourceError::NotConfigured("YouTube"))?;
    let token = oauth::access_token(&sources.pool, Provider::Google, endpoint.as_ref(), now_ts())
        .await
        .ok_or(SourceError::NotConnected("YouTube"))?;

    let channels = youtube::list_subscriptions(&sources.client, &token).await?;

    let mut videos = Vec::new();
    for batch in channels.chunks(BATCH_SIZE) {
        let results = join_all(
            batch
                .iter()
                .map(|channel| youtube::channel_videos(&sources.client, channel)),
        )
        .await;
        for (channel, result) in batch.iter().zip(results) {
            match result {
                Ok(found) => videos.extend(found),
                Err(e) => {
                    tracing::warn!(channel = %channel.id, error = %e, "Channel feed failed")
                }
            }
        }
    }

    let candidates = newest_first(videos, CANDIDATE_LIMIT);
    let mut kept = Vec::with_capacity(candidates.len());
    for batch in candidates.chunks(BATCH_SIZE) {
        let shorts = join_all(
            batch
                .iter()
                .map(|video| youtube::is_short(&sources.no_redirect_client, &video.id)),
        )
        .await;
        kept.extend(
            batch
                .iter()
                .zip(shorts)
                .filter(|(_, short)| !short)
                .map(|(video, _)| video.clone()),
        );
    }

    tracing::info!(
        channels = channels.len(),
        videos = kept.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "YouTube subscriptions refreshed"
    );
    Ok(kept)
}

/// Sorts by publish time, undated last, and keeps the first `limit`.
fn newest_first(mut videos: Vec<Video>, limit: usize) -> Vec<Video> {
    videos.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    videos.truncate(limit);
    videos
}
