use crate::schema::*;
use diesel::{dsl::max, prelude::*};
use serde::{Deserialize, Serialize};

use super::now_ts;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Selectable, PartialEq)]
#[diesel(table_name = todos)]
pub struct Todo {
    pub id: i32,
    pub title: String,
    pub completed: bool,
    /// `YYYY-MM-DD`
    pub due_date: Option<String>,
    /// Set once the todo has been mirrored to Google Tasks.
    pub google_task_id: Option<String>,
    pub position: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = todos)]
pub struct NewTodo {
    pub title: String,
    pub completed: bool,
    pub due_date: Option<String>,
    pub google_task_id: Option<String>,
    pub position: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl NewTodo {
    pub fn new(title: &str, due_date: Option<String>) -> Self {
        let now = now_ts();
        NewTodo {
            title: title.to_string(),
            completed: false,
            due_date,
            google_task_id: None,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Inserts at the end of the list.
    pub fn insert(mut self, conn: &mut SqliteConnection) -> QueryResult<Todo> {
        use crate::schema::todos::dsl::{position, todos};
        let last: Option<i32> = todos.select(max(position)).first(conn)?;
        self.position = last.map(|p| p + 1).unwrap_or(0);
        diesel::insert_into(todos).values(&self).get_result(conn)
    }
}

#[derive(Debug, Default, Deserialize, AsChangeset)]
#[diesel(table_name = todos)]
pub struct PartialTodo {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<String>,
    pub position: Option<i32>,
    #[serde(skip)]
    pub google_task_id: Option<String>,
    #[serde(skip)]
    pub updated_at: Option<i64>,
}

impl PartialTodo {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.completed.is_none()
            && self.due_date.is_none()
            && self.position.is_none()
            && self.google_task_id.is_none()
    }
}

impl Todo {
    pub fn get_all(conn: &mut SqliteConnection) -> QueryResult<Vec<Todo>> {
        use crate::schema::todos::dsl::{completed, id, position, todos};
        todos
            .order((completed.asc(), position.asc(), id.asc()))
            .load::<Todo>(conn)
    }

    pub fn get_by_id(conn: &mut SqliteConnection, todo_id: i32) -> QueryResult<Todo> {
        use crate::schema::todos::dsl::todos;
        todos.find(todo_id).first::<Todo>(conn)
    }

    pub fn get_by_google_task_id(
        conn: &mut SqliteConnection,
        task_id: &str,
    ) -> QueryResult<Option<Todo>> {
        use crate::schema::todos::dsl::{google_task_id, todos};
        todos
            .filter(google_task_id.eq(task_id))
            .first::<Todo>(conn)
            .optional()
    }

    pub fn update(
        conn: &mut SqliteConnection,
        todo_id: i32,
        mut update: PartialTodo,
    ) -> QueryResult<Todo> {
        use crate::schema::todos::dsl::todos;
        update.updated_at = Some(now_ts());
        diesel::update(todos.find(todo_id))
            .set(&update)
            .get_result(conn)
    }

    pub fn delete(conn: &mut SqliteConnection, todo_id: i32) -> QueryResult<bool> {
        use crate::schema::todos::dsl::todos;
        diesel::delete(todos.find(todo_id))
            .execute(conn)
            .map(|deleted| deleted > 0)
    }

    /// Removes mirrored todos whose Google task is not in `remaining`.
    /// Local-only todos are kept.
    pub fn delete_synced_except(
        conn: &mut SqliteConnection,
        remaining: &[String],
    ) -> QueryResult<usize> {
        use crate::schema::todos::dsl::{google_task_id, todos};
        diesel::delete(
            todos
                .filter(google_task_id.is_not_null())
                .filter(google_task_id.ne_all(remaining)),
        )
        .execute(conn)
    }
}
