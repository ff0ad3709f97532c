use async_trait::async_trait;

use crate::domain::errors::FeedResult;
use crate::models::{NotificationInput, NotificationRecord};

/// Backend notifications resource
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// List notifications with offset pagination, in server order
    async fn list_notifications(&self, skip: usize, limit: usize)
        -> FeedResult<Vec<NotificationRecord>>;

    /// Create a notification
    async fn create_notification(&self, input: &NotificationInput)
        -> FeedResult<NotificationRecord>;

    /// Replace title and content of an existing notification
    async fn update_notification(
        &self,
        id: i64,
        input: &NotificationInput,
    ) -> FeedResult<NotificationRecord>;

    /// Delete a notification
    async fn delete_notification(&self, id: i64) -> FeedResult<()>;
}
