use actix_web::{delete, get, post, web, HttpResponse};
use chrono::{Duration, Local};

use super::types::{HabitCreate, HabitWithCompletions, ToggleRequest, ToggleResponse};
use crate::{
    api::RqId,
    errors::{AppError, AppResult},
    models::habit::{Habit, NewHabit},
    security::validation::{self, MAX_TEXT_LENGTH},
    session::SessionClaims,
    RqDbPool,
};

/// Days of history returned with each habit.
pub const HISTORY_DAYS: i64 = 30;

#[get("")]
pub async fn get_habits(pool: RqDbPool, _claims: SessionClaims) -> AppResult<HttpResponse> {
    let since = (Local::now().date_naive() - Duration::days(HISTORY_DAYS))
        .format("%Y-%m-%d")
        .to_string();

    let mut conn = pool.get()?;
    let habits = Habit::get_all(&mut conn)?;
    let completions = Habit::completions_since(&mut conn, &since)?;

    Ok(HttpResponse::Ok().json(HabitWithCompletions::group(habits, completions)))
}

#[post("")]
pub async fn create_habit(
    pool: RqDbPool,
    habit_req: web::Json<HabitCreate>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let name = habit_req.name.trim();
    validation::validate_text(name, MAX_TEXT_LENGTH)
        .map_err(|e| AppError::invalid_input("name", &e))?;
    if let Some(color) = &habit_req.color {
        validation::validate_color(color).map_err(|e| AppError::invalid_input("color", &e))?;
    }

    let mut conn = pool.get()?;
    let habit = NewHabit::new(name, habit_req.color.as_deref()).insert(&mut conn)?;
    Ok(HttpResponse::Created().json(habit))
}

#[delete("/{id}")]
pub async fn delete_habit(
    pool: RqDbPool,
    path: RqId,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let mut conn = pool.get()?;
    if !Habit::delete(&mut conn, path.id)? {
        return Err(AppError::resource_not_found("Habit"));
    }
    Ok(HttpResponse::NoContent().finish())
}

#[post("/{id}/toggle")]
pub async fn toggle_habit(
    pool: RqDbPool,
    path: RqId,
    toggle_req: web::Json<ToggleRequest>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    validation::validate_date(&toggle_req.date).map_err(|e| AppError::invalid_input("date", &e))?;

    let mut conn = pool.get()?;
    Habit::get_by_id(&mut conn, path.id).map_err(|_| AppError::resource_not_found("Habit"))?;
    let completed = Habit::toggle(&mut conn, path.id, &toggle_req.date)?;

    Ok(HttpResponse::Ok().json(ToggleResponse { completed }))
}
