use actix_web::{delete, get, patch, post, web, HttpResponse};

use super::sync::merge_remote_tasks;
use super::types::{SyncResponse, TodoCreate};
use crate::{
    api::{widgets::handlers::provider_token, RqId, RqState},
    errors::{AppError, AppResult},
    models::{
        oauth_token::Provider,
        todo::{NewTodo, PartialTodo, Todo},
    },
    security::validation::{self, MAX_TEXT_LENGTH},
    session::SessionClaims,
    sources::{
        google::{self, TaskPayload},
        SourceError,
    },
    RqDbPool,
};

fn validate_fields(title: Option<&str>, due_date: Option<&str>) -> AppResult<()> {
    if let Some(title) = title {
        validation::validate_text(title, MAX_TEXT_LENGTH)
            .map_err(|e| AppError::invalid_input("title", &e))?;
    }
    if let Some(due_date) = due_date {
        validation::validate_date(due_date).map_err(|e| AppError::invalid_input("due_date", &e))?;
    }
    Ok(())
}

#[get("")]
pub async fn get_todos(pool: RqDbPool, _claims: SessionClaims) -> AppResult<HttpResponse> {
    let mut conn = pool.get()?;
    let todos = Todo::get_all(&mut conn)?;
    Ok(HttpResponse::Ok().json(todos))
}

#[post("")]
pub async fn create_todo(
    pool: RqDbPool,
    state: RqState,
    todo_req: web::Json<TodoCreate>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let title = todo_req.title.trim();
    validate_fields(Some(title), todo_req.due_date.as_deref())?;

    let mut todo = {
        let mut conn = pool.get()?;
        NewTodo::new(title, todo_req.due_date.clone()).insert(&mut conn)?
    };

    if let Some(token) = provider_token(&pool, &state, Provider::Google).await {
        let payload = TaskPayload {
            title: Some(todo.title.clone()),
            status: None,
            due: todo.due_date.as_deref().map(TaskPayload::due_from_date),
        };
        match google::insert_task(&state.client, &token, &payload).await {
            Ok(task) => {
                let mut conn = pool.get()?;
                let update = PartialTodo {
                    google_task_id: Some(task.id),
                    ..Default::default()
                };
                todo = Todo::update(&mut conn, todo.id, update)?;
            }
            Err(e) => tracing::warn!(todo_id = todo.id, error = %e, "Todo not pushed to Google Tasks"),
        }
    }

    Ok(HttpResponse::Created().json(todo))
}

#[patch("/{id}")]
pub async fn update_todo(
    pool: RqDbPool,
    state: RqState,
    path: RqId,
    update_req: web::Json<PartialTodo>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let mut update = update_req.into_inner();
    if update.is_empty() {
        return Err(AppError::invalid_input("body", "Nothing to update"));
    }
    update.title = update.title.map(|title| title.trim().to_string());
    validate_fields(update.title.as_deref(), update.due_date.as_deref())?;

    let payload = TaskPayload {
        title: update.title.clone(),
        status: update.completed.map(TaskPayload::status_for),
        due: update.due_date.as_deref().map(TaskPayload::due_from_date),
    };

    let todo = {
        let mut conn = pool.get()?;
        Todo::get_by_id(&mut conn, path.id).map_err(|_| AppError::resource_not_found("Todo"))?;
        Todo::update(&mut conn, path.id, update)?
    };

    if let Some(task_id) = &todo.google_task_id {
        if let Some(token) = provider_token(&pool, &state, Provider::Google).await {
            if let Err(e) = google::patch_task(&state.client, &token, task_id, &payload).await {
                tracing::warn!(todo_id = todo.id, error = %e, "Google task update failed");
            }
        }
    }

    Ok(HttpResponse::Ok().json(todo))
}

#[delete("/{id}")]
pub async fn delete_todo(
    pool: RqDbPool,
    state: RqState,
    path: RqId,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let todo = {
        let mut conn = pool.get()?;
        let todo = Todo::get_by_id(&mut conn, path.id)
            .map_err(|_| AppError::resource_not_found("Todo"))?;
        Todo::delete(&mut conn, todo.id)?;
        todo
    };

    if let Some(task_id) = &todo.google_task_id {
        if let Some(token) = provider_token(&pool, &state, Provider::Google).await {
            if let Err(e) = google::delete_task(&state.client, &token, task_id).await {
                tracing::warn!(todo_id = todo.id, error = %e, "Google task delete failed");
            }
        }
    }

    Ok(HttpResponse::NoContent().finish())
}

#[post("/sync")]
pub async fn sync_todos(
    pool: RqDbPool,
    state: RqState,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let token = provider_token(&pool, &state, Provider::Google)
        .await
        .ok_or(SourceError::NotConnected("Google Tasks"))?;
    let tasks = google::list_tasks(&state.client, &token).await?;

    let mut conn = pool.get()?;
    let summary = merge_remote_tasks(&mut conn, &tasks)?;
    let todos = Todo::get_all(&mut conn)?;
    tracing::info!(
        imported = summary.imported,
        updated = summary.updated,
        removed = summary.removed,
        "Google Tasks synced"
    );

    Ok(HttpResponse::Ok().json(SyncResponse { summary, todos }))
}
