use std::env;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Client credentials for one OAuth provider.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GithubConfig {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub public_path: String,
    pub host: String,
    pub port: u16,
    pub extension_token: Option<String>,
    pub google: Option<OAuthClient>,
    pub spotify: Option<OAuthClient>,
    pub github: Option<GithubConfig>,
    pub weather: WeatherLocation,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = var("HOMEPAGE_DATABASE_URL").unwrap_or_else(|| "./homepage.db".to_string());
        let public_path =
            var("HOMEPAGE_PUBLIC_PATH").unwrap_or_else(|| "./homepage-ui/dist".to_string());
        let host = var("HOMEPAGE_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or("HOMEPAGE_PORT", var("HOMEPAGE_PORT"), 8080u16)?;

        let oauth_client = |prefix: &str| {
            Some(OAuthClient {
                client_id: var(&format!("{prefix}_CLIENT_ID"))?,
                client_secret: var(&format!("{prefix}_CLIENT_SECRET"))?,
                redirect_uri: var(&format!("{prefix}_REDIRECT_URI"))?,
            })
        };

        let github = match (var("GITHUB_TOKEN"), var("GITHUB_USERNAME")) {
            (Some(token), Some(username)) => Some(GithubConfig { token, username }),
            _ => None,
        };

        let weather = WeatherLocation {
            latitude: parse_or("WEATHER_LATITUDE", var("WEATHER_LATITUDE"), 52.52)?,
            longitude: parse_or("WEATHER_LONGITUDE", var("WEATHER_LONGITUDE"), 13.41)?,
        };

        let config = AppConfig {
            database_url,
            public_path,
            host,
            port,
            extension_token: var("HOMEPAGE_EXTENSION_TOKEN"),
            google: oauth_client("GOOGLE"),
            spotify: oauth_client("SPOTIFY"),
            github,
            weather,
        };

        log::info!(
            "Configuration loaded: db={} public={} google={} spotify={} github={}",
            config.database_url,
            config.public_path,
            config.google.is_some(),
            config.spotify.is_some(),
            config.github.is_some()
        );

        Ok(config)
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
