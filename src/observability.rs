use diesel::prelude::*;
use std::time::SystemTime;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::CacheSnapshot;

/// Initialize structured logging and tracing
pub fn init_logging() {
    let config = LoggingConfig::from_env();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(false)
                    .with_span_list(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init();
    }

    info!(
        service = "homepage",
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.log_level,
        log_format = %config.log_format,
        "Logging initialized"
    );
}

pub struct LoggingConfig {
    pub log_level: String,
    pub log_format: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            log_level: std::env::var("HOMEPAGE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: std::env::var("HOMEPAGE_LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string()),
        }
    }
}

/// Process start time, for uptime reporting.
#[derive(Clone, Copy)]
pub struct Uptime {
    pub start_time: SystemTime,
}

impl Uptime {
    pub fn new() -> Self {
        Self {
            start_time: SystemTime::now(),
        }
    }

    pub fn seconds(&self) -> u64 {
        self.start_time
            .elapsed()
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

impl Default for Uptime {
    fn default() -> Self {
        Self::new()
    }
}

/// Application health status
#[derive(Clone, Debug, serde::Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct HealthChecks {
    pub database: String,
    pub caches: Vec<CacheSnapshot>,
}

impl HealthStatus {
    pub fn check(uptime: &Uptime, pool: &crate::DbPool, caches: Vec<CacheSnapshot>) -> Self {
        let database = check_database_health(pool);
        let status = if database == "healthy" { "healthy" } else { "unhealthy" };

        Self {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: uptime.seconds(),
            checks: HealthChecks {
                database: database.to_string(),
                caches,
            },
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

fn check_database_health(pool: &crate::DbPool) -> &'static str {
    match pool.get() {
        Ok(mut conn) => match diesel::sql_query("SELECT 1").execute(&mut conn) {
            Ok(_) => "healthy",
            Err(e) => {
                tracing::warn!(error = %e, "Database health query failed");
                "unhealthy"
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Database pool unavailable");
            "unhealthy"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_db;

    #[test]
    fn test_health_check_with_live_database() {
        let (_dir, pool) = create_test_db();
        let status = HealthStatus::check(&Uptime::new(), &pool, Vec::new());

        assert!(status.is_healthy());
        assert_eq!(status.checks.database, "healthy");
        assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
    }
}
