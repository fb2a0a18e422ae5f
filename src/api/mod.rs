pub mod auth;
pub mod bookmarks;
pub mod caches;
pub mod habits;
pub mod health;
pub mod memos;
pub mod oauth;
pub mod rss;
pub mod todos;
pub mod widgets;

mod routes;
pub use routes::routes;

use actix_web::web;
use serde::Deserialize;

use crate::state::AppState;

pub type RqState = web::Data<AppState>;

#[derive(Debug, Deserialize)]
pub struct IdPath {
    pub id: i32,
}

pub type RqId = web::Path<IdPath>;

/// `?limit=` on list endpoints served from a cache.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}
