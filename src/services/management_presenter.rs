use std::sync::Arc;

use chrono_tz::Tz;
use tracing::{info, warn};

use crate::domain::errors::{FeedError, FeedResult};
use crate::domain::ports::notification_api::NotificationApi;
use crate::models::{NotificationInput, NotificationRecord};
use crate::services::feed_presenter::FeedPresenter;

/// Kind of write performed from the management surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Message shown after a create/update/delete, separate from the feed error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStatus {
    Succeeded { action: MutationKind, message: String },
    Failed { action: MutationKind, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The confirmation was declined; nothing was sent
    Cancelled,
}

/// Admin surface: the read-only feed plus create, update and delete.
///
/// Every successful write is followed by a full refresh of this surface's
/// own feed. Failed writes leave the feed exactly as it was.
pub struct ManagementPresenter {
    feed: FeedPresenter,
    api: Arc<dyn NotificationApi>,
    action_status: Option<ActionStatus>,
}

impl ManagementPresenter {
    pub fn new(api: Arc<dyn NotificationApi>, page_size: usize, timezone: Tz) -> Self {
        Self {
            feed: FeedPresenter::new(api.clone(), page_size, timezone),
            api,
            action_status: None,
        }
    }

    pub fn feed(&self) -> &FeedPresenter {
        &self.feed
    }

    pub fn action_status(&self) -> Option<&ActionStatus> {
        self.action_status.as_ref()
    }

    pub async fn create(&mut self, title: &str, content: &str) -> FeedResult<NotificationRecord> {
        let input = NotificationInput::new(title, content);
        self.validate(MutationKind::Create, &input)?;

        match self.api.create_notification(&input).await {
            Ok(record) => {
                info!("Created notification {}", record.id);
                self.succeeded(MutationKind::Create, "Notification created").await;
                Ok(record)
            }
            Err(e) => {
                self.failed(MutationKind::Create, &e);
                Err(e)
            }
        }
    }

    pub async fn update(
        &mut self,
        id: i64,
        title: &str,
        content: &str,
    ) -> FeedResult<NotificationRecord> {
        let input = NotificationInput::new(title, content);
        self.validate(MutationKind::Update, &input)?;

        match self.api.update_notification(id, &input).await {
            Ok(record) => {
                info!("Updated notification {}", id);
                self.succeeded(MutationKind::Update, "Notification updated").await;
                Ok(record)
            }
            Err(e) => {
                self.failed(MutationKind::Update, &e);
                Err(e)
            }
        }
    }

    /// Delete after `confirm` returns true for the id
    pub async fn delete<F>(&mut self, id: i64, confirm: F) -> FeedResult<DeleteOutcome>
    where
        F: FnOnce(i64) -> bool,
    {
        if !confirm(id) {
            info!("Deletion of notification {} cancelled", id);
            metrics::counter!(
                "notification_mutations_total",
                "action" => "delete",
                "outcome" => "cancelled"
            )
            .increment(1);
            return Ok(DeleteOutcome::Cancelled);
        }

        match self.api.delete_notification(id).await {
            Ok(()) => {
                info!("Deleted notification {}", id);
                self.succeeded(MutationKind::Delete, "Notification deleted").await;
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                self.failed(MutationKind::Delete, &e);
                Err(e)
            }
        }
    }

    fn validate(&mut self, action: MutationKind, input: &NotificationInput) -> FeedResult<()> {
        input.validate().inspect_err(|e| {
            metrics::counter!(
                "notification_mutations_total",
                "action" => action.as_str(),
                "outcome" => "invalid"
            )
            .increment(1);
            self.action_status = Some(ActionStatus::Failed {
                action,
                message: e.user_message(),
            });
        })
    }

    async fn succeeded(&mut self, action: MutationKind, message: &str) {
        metrics::counter!(
            "notification_mutations_total",
            "action" => action.as_str(),
            "outcome" => "success"
        )
        .increment(1);
        self.action_status = Some(ActionStatus::Succeeded {
            action,
            message: message.to_string(),
        });
        self.feed.refresh().await;
    }

    fn failed(&mut self, action: MutationKind, error: &FeedError) {
        warn!("Notification {} failed: {}", action, error);
        metrics::counter!(
            "notification_mutations_total",
            "action" => action.as_str(),
            "outcome" => "failure"
        )
        .increment(1);
        self.action_status = Some(ActionStatus::Failed {
            action,
            message: error.user_message(),
        });
    }
}
