use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::aggregators::{self, youtube::YoutubeSources};
use crate::cache::{CacheSnapshot, SwrCache};
use crate::config::{AppConfig, OAuthClient};
use crate::models::{oauth_token::Provider, rss::ArticleView};
use crate::observability::Uptime;
use crate::sources::{
    github::ContributionCalendar,
    http,
    oauth::{HttpTokenEndpoint, TokenEndpoint},
    youtube::Video,
    SourceError,
};
use crate::DbPool;

pub const RSS_TTL: Duration = Duration::from_secs(30 * 60);
pub const YOUTUBE_TTL: Duration = Duration::from_secs(30 * 60);
pub const GITHUB_TTL: Duration = Duration::from_secs(60 * 60);

/// Process-wide state shared by every handler.
pub struct AppState {
    pub config: AppConfig,
    pub client: Client,
    pub google: Option<Arc<HttpTokenEndpoint>>,
    pub spotify: Option<Arc<HttpTokenEndpoint>>,
    pub rss: Arc<SwrCache<Vec<ArticleView>>>,
    pub youtube: Arc<SwrCache<Vec<Video>>>,
    pub github: Arc<SwrCache<ContributionCalendar>>,
    pub uptime: Uptime,
}

impl AppState {
    pub fn new(config: AppConfig, pool: DbPool) -> Result<Self, SourceError> {
        let client = http::build_client()?;
        let no_redirect_client = http::build_no_redirect_client()?;

        let endpoint = |provider: Provider, credentials: &Option<OAuthClient>| {
            credentials.clone().map(|credentials| {
                Arc::new(HttpTokenEndpoint::new(client.clone(), provider, credentials))
            })
        };
        let google = endpoint(Provider::Google, &config.google);
        let spotify = endpoint(Provider::Spotify, &config.spotify);

        let rss = {
            let pool = pool.clone();
            let client = client.clone();
            SwrCache::new("rss", RSS_TTL, move || {
                aggregators::rss::load_articles(pool.clone(), client.clone())
            })
        };

        let youtube = {
            let sources = Arc::new(YoutubeSources {
                pool: pool.clone(),
                client: client.clone(),
                no_redirect_client,
                google: google
                    .clone()
                    .map(|endpoint| endpoint as Arc<dyn TokenEndpoint>),
            });
            SwrCache::new("youtube", YOUTUBE_TTL, move || {
                aggregators::youtube::load_videos(Arc::clone(&sources))
            })
        };

        let github = {
            let client = client.clone();
            let github_config = config.github.clone();
            SwrCache::new("github", GITHUB_TTL, move || {
                aggregators::github::load_contributions(client.clone(), github_config.clone())
            })
        };

        Ok(AppState {
            config,
            client,
            google,
            spotify,
            rss,
            youtube,
            github,
            uptime: Uptime::new(),
        })
    }

    pub fn token_endpoint(&self, provider: Provider) -> Option<&Arc<HttpTokenEndpoint>> {
        match provider {
            Provider::Google => self.google.as_ref(),
            Provider::Spotify => self.spotify.as_ref(),
        }
    }

    pub fn oauth_client(&self, provider: Provider) -> Option<&OAuthClient> {
        match provider {
            Provider::Google => self.config.google.as_ref(),
            Provider::Spotify => self.config.spotify.as_ref(),
        }
    }

    pub fn cache_snapshots(&self) -> Vec<CacheSnapshot> {
        vec![
            self.rss.snapshot(),
            self.youtube.snapshot(),
            self.github.snapshot(),
        ]
    }
}
