pub mod handlers;
pub mod types;

use actix_web::{web, Scope};

pub fn routes() -> Scope {
    web::scope("/bookmarks")
        .service(handlers::get_bookmarks)
        .service(handlers::create_bookmark)
        .service(handlers::update_bookmark)
        .service(handlers::delete_bookmark)
}

/// Routes for the browser extension, authenticated by bearer token.
pub fn extension_routes() -> Scope {
    web::scope("/extension").service(handlers::extension_add_bookmark)
}
