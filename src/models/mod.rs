pub mod bookmark;
pub mod habit;
pub mod memo;
pub mod oauth_token;
pub mod rss;
pub mod session;
pub mod todo;
pub mod user;

/// Current unix time in seconds, the unit every timestamp column uses.
pub fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}
