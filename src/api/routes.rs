use super::{bookmarks, caches, habits, memos, oauth, rss, todos, widgets};
use actix_web::{web, Scope};

pub fn routes() -> Scope {
    web::scope("/api")
        .service(rss::routes())
        .service(todos::routes())
        .service(memos::routes())
        .service(habits::routes())
        .service(bookmarks::routes())
        .service(bookmarks::extension_routes())
        .configure(caches::configure)
        .configure(widgets::configure)
        // provider-prefixed paths last, after /api/spotify/now-playing
        .configure(oauth::configure)
}
