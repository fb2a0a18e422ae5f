pub mod handlers;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::get_youtube)
        .service(handlers::get_github)
        .service(handlers::get_cache_status);
}
