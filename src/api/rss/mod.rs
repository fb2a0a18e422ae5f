pub mod handlers;
pub mod types;

use actix_web::{web, Scope};

pub fn routes() -> Scope {
    web::scope("/rss")
        .service(handlers::get_articles)
        .service(handlers::refresh_articles)
        .service(handlers::get_feeds)
        .service(handlers::create_feed)
        .service(handlers::update_feed)
        .service(handlers::delete_feed)
        .service(handlers::get_categories)
        .service(handlers::create_category)
        .service(handlers::delete_category)
}
