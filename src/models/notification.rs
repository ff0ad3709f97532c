use serde::{Deserialize, Serialize};

use crate::domain::errors::{FeedError, FeedResult};

/// A notification as returned by the backend list endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: String, // ISO 8601 timestamp
    pub updated_at: String, // ISO 8601 timestamp
}

impl NotificationRecord {
    /// True once the record has been edited after creation
    pub fn is_edited(&self) -> bool {
        self.updated_at != self.created_at
    }
}

/// Request body for create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationInput {
    pub title: String,
    pub content: String,
}

impl NotificationInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Both fields are required; whitespace-only counts as empty.
    pub fn validate(&self) -> FeedResult<()> {
        if self.title.trim().is_empty() {
            return Err(FeedError::Validation("Title is required".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(FeedError::Validation("Content is required".to_string()));
        }
        Ok(())
    }
}
