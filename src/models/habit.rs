use crate::schema::*;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::now_ts;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Selectable, PartialEq)]
#[diesel(table_name = habits)]
pub struct Habit {
    pub id: i32,
    pub name: String,
    pub color: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = habits)]
pub struct NewHabit<'a> {
    pub name: &'a str,
    pub color: Option<&'a str>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Queryable, Identifiable, Associations, Selectable, PartialEq)]
#[diesel(belongs_to(Habit))]
#[diesel(table_name = habit_completions)]
pub struct HabitCompletion {
    pub id: i32,
    pub habit_id: i32,
    /// `YYYY-MM-DD`
    pub completed_on: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = habit_completions)]
struct NewHabitCompletion<'a> {
    habit_id: i32,
    completed_on: &'a str,
}

impl<'a> NewHabit<'a> {
    pub fn new(name: &'a str, color: Option<&'a str>) -> Self {
        NewHabit {
            name,
            color,
            created_at: now_ts(),
        }
    }

    pub fn insert(&self, conn: &mut SqliteConnection) -> QueryResult<Habit> {
        use crate::schema::habits::dsl::habits;
        diesel::insert_into(habits).values(self).get_result(conn)
    }
}

impl Habit {
    pub fn get_all(conn: &mut SqliteConnection) -> QueryResult<Vec<Habit>> {
        use crate::schema::habits::dsl::{habits, id};
        habits.order(id.asc()).load(conn)
    }

    pub fn get_by_id(conn: &mut SqliteConnection, habit_id: i32) -> QueryResult<Habit> {
        use crate::schema::habits::dsl::habits;
        habits.find(habit_id).first(conn)
    }

    /// Deletes the habit together with its completions.
    pub fn delete(conn: &mut SqliteConnection, habit_id: i32) -> QueryResult<bool> {
        conn.transaction(|conn| {
            diesel::delete(
                habit_completions::table.filter(habit_completions::habit_id.eq(habit_id)),
            )
            .execute(conn)?;
            diesel::delete(habits::table.find(habit_id))
                .execute(conn)
                .map(|deleted| deleted > 0)
        })
    }

    /// Flips the completion for `date`. Returns whether the habit is now done on that day.
    pub fn toggle(conn: &mut SqliteConnection, habit_id: i32, date: &str) -> QueryResult<bool> {
        use crate::schema::habit_completions::dsl::{completed_on, habit_completions, habit_id as hid};
        conn.transaction(|conn| {
            let removed = diesel::delete(
                habit_completions
                    .filter(hid.eq(habit_id))
                    .filter(completed_on.eq(date)),
            )
            .execute(conn)?;
            if removed > 0 {
                return Ok(false);
            }
            diesel::insert_into(habit_completions)
                .values(&NewHabitCompletion {
                    habit_id,
                    completed_on: date,
                })
                .execute(conn)?;
            Ok(true)
        })
    }

    /// Completions on or after `since` (`YYYY-MM-DD`), for every habit.
    pub fn completions_since(
        conn: &mut SqliteConnection,
        since: &str,
    ) -> QueryResult<Vec<HabitCompletion>> {
        use crate::schema::habit_completions::dsl::{completed_on, habit_completions};
        habit_completions
            .filter(completed_on.ge(since))
            .order(completed_on.asc())
            .load(conn)
    }
}
