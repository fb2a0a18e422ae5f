pub mod handlers;
pub mod sync;
pub mod types;

use actix_web::{web, Scope};

pub fn routes() -> Scope {
    web::scope("/todos")
        .service(handlers::get_todos)
        .service(handlers::create_todo)
        .service(handlers::sync_todos)
        .service(handlers::update_todo)
        .service(handlers::delete_todo)
}
