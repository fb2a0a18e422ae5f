pub mod handlers;
pub mod types;

use actix_web::{web, Scope};

pub fn routes() -> Scope {
    web::scope("/habits")
        .service(handlers::get_habits)
        .service(handlers::create_habit)
        .service(handlers::delete_habit)
        .service(handlers::toggle_habit)
}
