pub mod handlers;
pub mod types;

use actix_web::{web, Scope};

pub fn routes() -> Scope {
    web::scope("/memos")
        .service(handlers::get_memos)
        .service(handlers::create_memo)
        .service(handlers::update_memo)
        .service(handlers::delete_memo)
}
