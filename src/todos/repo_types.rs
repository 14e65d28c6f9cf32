use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Todo record. `completed_at` is set iff `completed` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub text: String,
    pub completed: bool,
    #[serde(rename = "completedAt")]
    pub completed_at: Option<i64>, // unix millis
    #[serde(rename = "_creator")]
    pub owner_id: Uuid,
}

impl Todo {
    pub fn new(owner_id: Uuid, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            completed: false,
            completed_at: None,
            owner_id,
        }
    }
}

/// Validated partial update; `text` is already trimmed and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn apply(&self, todo: &mut Todo, now_millis: i64) {
        if let Some(text) = &self.text {
            todo.text = text.clone();
        }
        match self.completed {
            Some(true) => {
                // keep the original transition time on repeated completes
                if !todo.completed || todo.completed_at.is_none() {
                    todo.completed_at = Some(now_millis);
                }
                todo.completed = true;
            }
            Some(false) => {
                todo.completed = false;
                todo.completed_at = None;
            }
            None => {
                if !todo.completed {
                    todo.completed_at = None;
                }
            }
        }
    }
}

pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
