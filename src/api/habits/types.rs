use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::habit::{Habit, HabitCompletion};

#[derive(Debug, Deserialize)]
pub struct HabitCreate {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub completed: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct HabitWithCompletions {
    #[serde(flatten)]
    pub habit: Habit,
    /// `YYYY-MM-DD`, oldest first.
    pub completions: Vec<String>,
}

impl HabitWithCompletions {
    pub fn group(habits: Vec<Habit>, completions: Vec<HabitCompletion>) -> Vec<Self> {
        let mut by_habit: HashMap<i32, Vec<String>> = HashMap::new();
        for completion in completions {
            by_habit
                .entry(completion.habit_id)
                .or_default()
                .push(completion.completed_on);
        }
        habits
            .into_iter()
            .map(|habit| HabitWithCompletions {
                completions: by_habit.remove(&habit.id).unwrap_or_default(),
                habit,
            })
            .collect()
    }
}
