pub mod aggregators;
pub mod api;
pub mod cache;
pub mod claims;
pub mod config;
pub mod errors;
pub mod feeds;
pub mod models;
pub mod observability;
pub mod schema;
pub mod security;
pub mod session;
pub mod sources;
pub mod state;
#[cfg(test)]
pub mod test_helpers;

use actix_web::web;
use diesel::r2d2::{self, ConnectionManager};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/migrations");

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type RqDbPool = web::Data<DbPool>;

pub fn initialize_db_pool(db_path: &str) -> Result<DbPool, r2d2::PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    r2d2::Pool::builder().build(manager)
}
