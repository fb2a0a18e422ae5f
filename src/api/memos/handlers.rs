use actix_web::{delete, get, patch, post, web, HttpResponse};

use super::types::MemoCreate;
use crate::{
    api::RqId,
    errors::{AppError, AppResult},
    models::memo::{Memo, NewMemo, PartialMemo},
    security::validation::{self, MAX_MEMO_LENGTH},
    session::SessionClaims,
    RqDbPool,
};

#[get("")]
pub async fn get_memos(pool: RqDbPool, _claims: SessionClaims) -> AppResult<HttpResponse> {
    let mut conn = pool.get()?;
    let memos = Memo::get_all(&mut conn)?;
    Ok(HttpResponse::Ok().json(memos))
}

#[post("")]
pub async fn create_memo(
    pool: RqDbPool,
    memo_req: web::Json<MemoCreate>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    validation::validate_text(&memo_req.content, MAX_MEMO_LENGTH)
        .map_err(|e| AppError::invalid_input("content", &e))?;

    let mut conn = pool.get()?;
    let memo = NewMemo::new(&memo_req.content, memo_req.pinned).insert(&mut conn)?;
    Ok(HttpResponse::Created().json(memo))
}

#[patch("/{id}")]
pub async fn update_memo(
    pool: RqDbPool,
    path: RqId,
    update_req: web::Json<PartialMemo>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let update = update_req.into_inner();
    if update.is_empty() {
        return Err(AppError::invalid_input("body", "Nothing to update"));
    }
    if let Some(content) = &update.content {
        validation::validate_text(content, MAX_MEMO_LENGTH)
            .map_err(|e| AppError::invalid_input("content", &e))?;
    }

    let mut conn = pool.get()?;
    let memo = Memo::update(&mut conn, path.id, update)?;
    Ok(HttpResponse::Ok().json(memo))
}

#[delete("/{id}")]
pub async fn delete_memo(
    pool: RqDbPool,
    path: RqId,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let mut conn = pool.get()?;
    if !Memo::delete(&mut conn, path.id)? {
        return Err(AppError::resource_not_found("Memo"));
    }
    Ok(HttpResponse::NoContent().finish())
}
