use actix_web::{delete, get, patch, post, web, HttpResponse};

use super::types::BookmarkCreate;
use crate::{
    api::RqId,
    claims::ExtensionClaims,
    errors::{AppError, AppResult},
    models::bookmark::{Bookmark, NewBookmark, PartialBookmark},
    security::validation::{self, MAX_TEXT_LENGTH},
    session::SessionClaims,
    RqDbPool,
};

/// Validates the request and falls back to the URL when no title was given.
fn checked_fields(req: &BookmarkCreate) -> AppResult<(&str, &str)> {
    let url = req.url.trim();
    validation::validate_url(url).map_err(|e| AppError::invalid_input("url", &e))?;
    if let Some(favicon) = &req.favicon {
        validation::validate_url(favicon).map_err(|e| AppError::invalid_input("favicon", &e))?;
    }
    let title = match req.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => title,
        _ => url,
    };
    validation::validate_text(title, MAX_TEXT_LENGTH)
        .map_err(|e| AppError::invalid_input("title", &e))?;
    Ok((url, title))
}

fn add_bookmark(pool: &RqDbPool, req: &BookmarkCreate) -> AppResult<Bookmark> {
    let (url, title) = checked_fields(req)?;
    let mut conn = pool.get()?;
    Ok(NewBookmark::new(title, url, req.favicon.as_deref()).insert_if_not_present(&mut conn)?)
}

#[get("")]
pub async fn get_bookmarks(pool: RqDbPool, _claims: SessionClaims) -> AppResult<HttpResponse> {
    let mut conn = pool.get()?;
    let bookmarks = Bookmark::get_all(&mut conn)?;
    Ok(HttpResponse::Ok().json(bookmarks))
}

#[post("")]
pub async fn create_bookmark(
    pool: RqDbPool,
    bookmark_req: web::Json<BookmarkCreate>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let bookmark = add_bookmark(&pool, &bookmark_req)?;
    Ok(HttpResponse::Created().json(bookmark))
}

#[patch("/{id}")]
pub async fn update_bookmark(
    pool: RqDbPool,
    path: RqId,
    update_req: web::Json<PartialBookmark>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let update = update_req.into_inner();
    if update.is_empty() {
        return Err(AppError::invalid_input("body", "Nothing to update"));
    }
    if let Some(url) = &update.url {
        validation::validate_url(url).map_err(|e| AppError::invalid_input("url", &e))?;
    }
    if let Some(title) = &update.title {
        validation::validate_text(title, MAX_TEXT_LENGTH)
            .map_err(|e| AppError::invalid_input("title", &e))?;
    }

    let mut conn = pool.get()?;
    let bookmark = Bookmark::update(&mut conn, path.id, &update)?;
    Ok(HttpResponse::Ok().json(bookmark))
}

#[delete("/{id}")]
pub async fn delete_bookmark(
    pool: RqDbPool,
    path: RqId,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let mut conn = pool.get()?;
    if !Bookmark::delete(&mut conn, path.id)? {
        return Err(AppError::resource_not_found("Bookmark"));
    }
    Ok(HttpResponse::NoContent().finish())
}

#[post("/bookmarks")]
pub async fn extension_add_bookmark(
    pool: RqDbPool,
    bookmark_req: web::Json<BookmarkCreate>,
    _claims: ExtensionClaims,
) -> AppResult<HttpResponse> {
    let bookmark = add_bookmark(&pool, &bookmark_req)?;
    tracing::info!(bookmark_id = bookmark.id, "Bookmark added from extension");
    Ok(HttpResponse::Created().json(bookmark))
}
