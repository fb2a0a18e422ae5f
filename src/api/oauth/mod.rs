//! Authorization-code flow for the Google and Spotify connections.

pub mod handlers;
pub mod types;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::connect)
        .service(handlers::callback)
        .service(handlers::status)
        .service(handlers::disconnect);
}
