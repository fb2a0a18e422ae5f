pub mod handlers;
pub mod types;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::get_weather)
        .service(handlers::get_calendar)
        .service(handlers::get_now_playing)
        .service(handlers::control_player);
}
