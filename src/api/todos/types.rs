use serde::{Deserialize, Serialize};

use super::sync::SyncSummary;
use crate::models::todo::Todo;

#[derive(Debug, Deserialize)]
pub struct TodoCreate {
    pub title: String,
    pub due_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    #[serde(flatten)]
    pub summary: SyncSummary,
    pub todos: Vec<Todo>,
}
