pub mod handlers;
pub mod types;

use actix_web::{web, Scope};

pub fn routes() -> Scope {
    web::scope("/api/auth")
        .service(handlers::login)
        .service(handlers::logout)
        .service(handlers::me)
}
