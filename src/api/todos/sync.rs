//! Pulling Google Tasks into the local todo list.
//!
//! Google is the source of truth for mirrored todos: remote titles, status
//! and due dates overwrite local ones, and mirrored todos whose task was
//! deleted remotely are removed. Todos that were never pushed are untouched.

use diesel::prelude::*;
use serde::Serialize;

use crate::models::todo::{NewTodo, PartialTodo, Todo};
use crate::sources::google::GoogleTask;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SyncSummary {
    pub imported: usize,
    pub updated: usize,
    pub removed: usize,
}

pub fn merge_remote_tasks(
    conn: &mut SqliteConnection,
    tasks: &[GoogleTask],
) -> QueryResult<SyncSummary> {
    conn.transaction(|conn| {
        let mut summary = SyncSummary::default();

        for task in tasks {
            let title = task.title.trim();
            if title.is_empty() {
                continue;
            }

            match Todo::get_by_google_task_id(conn, &task.id)? {
                Some(todo) => {
                    if let Some(update) = changes(&todo, task) {
                        Todo::update(conn, todo.id, update)?;
                        summary.updated += 1;
                    }
                }
                None => {
                    let mut new = NewTodo::new(title, task.due_date());
                    new.completed = task.is_completed();
                    new.google_task_id = Some(task.id.clone());
                    new.insert(conn)?;
                    summary.imported += 1;
                }
            }
        }

        let remaining: Vec<String> = tasks.iter().map(|task| task.id.clone()).collect();
        summary.removed = Todo::delete_synced_except(conn, &remaining)?;

        Ok(summary)
    })
}

fn changes(todo: &Todo, task: &GoogleTask) -> Option<PartialTodo> {
    let mut update = PartialTodo::default();
    let title = task.title.trim();
    if !title.is_empty() && todo.title != title {
        update.title = Some(title.to_string());
    }
    if todo.completed != task.is_completed() {
        update.completed = Some(task.is_completed());
    }
    let due = task.due_date();
    if due.is_some() && todo.due_date != due {
        update.due_date = due;
    }
    (!update.is_empty()).then_some(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::get_test_db_connection;

    fn task(id: &str, title: &str, status: &str, due: Option<&str>) -> GoogleTask {
        GoogleTask {
            id: id.to_string(),
            title: title.to_string(),
            status: Some(status.to_string()),
            due: due.map(str::to_string),
            deleted: false,
        }
    }

    fn mirrored(conn: &mut SqliteConnection, title: &str, task_id: &str) -> Todo {
        let mut new = NewTodo::new(title, None);
        new.google_task_id = Some(task_id.to_string());
        new.insert(conn).unwrap()
    }

    #[test]
    fn test_imports_new_tasks() {
        let mut conn = get_test_db_connection();
        let tasks = vec![
            task("t1", "Buy milk", "needsAction", Some("2024-03-01T00:00:00.000Z")),
            task("t2", "Done already", "completed", None),
            task("t3", "   ", "needsAction", None),
        ];

        let summary = merge_remote_tasks(&mut conn, &tasks).unwrap();
        assert_eq!(
            summary,
            SyncSummary {
                imported: 2,
                updated: 0,
                removed: 0
            }
        );

        let milk = Todo::get_by_google_task_id(&mut conn, "t1").unwrap().unwrap();
        assert_eq!(milk.due_date.as_deref(), Some("2024-03-01"));
        assert!(!milk.completed);
        let done = Todo::get_by_google_task_id(&mut conn, "t2").unwrap().unwrap();
        assert!(done.completed);
    }

    #[test]
    fn test_updates_changed_and_removes_deleted() {
        let mut conn = get_test_db_connection();
        let kept = mirrored(&mut conn, "Old title", "t1");
        mirrored(&mut conn, "Gone upstream", "t2");
        let local = NewTodo::new("Never pushed", None).insert(&mut conn).unwrap();

        let summary =
            merge_remote_tasks(&mut conn, &[task("t1", "New title", "completed", None)]).unwrap();
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.imported, 0);

        let kept = Todo::get_by_id(&mut conn, kept.id).unwrap();
        assert_eq!(kept.title, "New title");
        assert!(kept.completed);
        assert!(Todo::get_by_id(&mut conn, local.id).is_ok());
        assert!(Todo::get_by_google_task_id(&mut conn, "t2").unwrap().is_none());
    }

    #[test]
    fn test_unchanged_task_is_not_counted() {
        let mut conn = get_test_db_connection();
        mirrored(&mut conn, "Same", "t1");

        let summary =
            merge_remote_tasks(&mut conn, &[task("t1", "Same", "needsAction", None)]).unwrap();
        assert_eq!(summary, SyncSummary::default());
    }
}
