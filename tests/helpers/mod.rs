#![allow(dead_code)]
pub mod fake_backend;

use portal_notifications::models::NotificationRecord;

pub use fake_backend::*;

pub fn record(id: i64, title: &str) -> NotificationRecord {
    NotificationRecord {
        id,
        title: title.to_string(),
        content: format!("{} details at https://portal.example.edu/n/{}", title, id),
        created_at: "2024-09-01T07:00:00".to_string(),
        updated_at: "2024-09-01T07:00:00".to_string(),
    }
}

pub fn ids(records: &[NotificationRecord]) -> Vec<i64> {
    records.iter().map(|r| r.id).collect()
}
