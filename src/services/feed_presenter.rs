use std::sync::Arc;

use chrono_tz::Tz;
use tokio::sync::watch;

use crate::domain::errors::FeedError;
use crate::domain::ports::notification_api::NotificationApi;
use crate::models::NotificationRecord;
use crate::services::formatting::{format_timestamp, preview, segment_content, ContentSegment};
use crate::services::notification_store::{FeedState, LoadOutcome, NotificationStore};

/// Graphemes shown per row in the dropdown
pub const PREVIEW_LENGTH: usize = 80;

/// One row of the dropdown list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub id: i64,
    pub title: String,
    pub preview: String,
    pub created_at: String,
}

/// Field values of a record captured when it was selected.
///
/// Not updated if the record changes afterwards; reselect to see edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDetail {
    pub id: i64,
    pub title: String,
    pub content: Vec<ContentSegment>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl NotificationDetail {
    fn capture(record: &NotificationRecord, tz: Tz) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            content: segment_content(&record.content),
            created_at: format_timestamp(&record.created_at, tz),
            updated_at: record
                .is_edited()
                .then(|| format_timestamp(&record.updated_at, tz)),
        }
    }
}

/// Read-only feed surface such as the header bell
pub struct FeedPresenter {
    store: NotificationStore,
    timezone: Tz,
    selected: Option<NotificationDetail>,
}

impl FeedPresenter {
    pub fn new(api: Arc<dyn NotificationApi>, page_size: usize, timezone: Tz) -> Self {
        Self {
            store: NotificationStore::new(api, page_size),
            timezone,
            selected: None,
        }
    }

    /// Load the first page for a freshly shown surface
    pub async fn mount(&self) -> LoadOutcome {
        self.store.load_initial().await
    }

    /// Tear down the surface. A response still in flight has nowhere to land.
    pub fn unmount(self) {
        tracing::debug!("Notification feed presenter unmounted");
    }

    pub async fn load_more(&self) -> LoadOutcome {
        self.store.load_more().await
    }

    pub async fn refresh(&self) -> LoadOutcome {
        self.store.refresh().await
    }

    pub fn state(&self) -> FeedState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.store.subscribe()
    }

    pub fn items(&self) -> Vec<NotificationRecord> {
        self.store.snapshot().items
    }

    pub fn is_loading(&self) -> bool {
        self.store.is_loading()
    }

    pub fn error(&self) -> Option<FeedError> {
        self.store.error()
    }

    pub fn has_more(&self) -> bool {
        self.store.has_more()
    }

    /// Whether the "load more" control should be offered
    pub fn can_load_more(&self) -> bool {
        let state = self.store.snapshot();
        state.has_more() && !state.loading
    }

    /// Rows for rendering, in feed order
    pub fn entries(&self) -> Vec<FeedEntry> {
        self.store
            .snapshot()
            .items
            .iter()
            .map(|record| FeedEntry {
                id: record.id,
                title: record.title.clone(),
                preview: preview(&record.content, PREVIEW_LENGTH),
                created_at: format_timestamp(&record.created_at, self.timezone),
            })
            .collect()
    }

    /// Open the detail view for a loaded record
    pub fn select(&mut self, id: i64) -> Option<&NotificationDetail> {
        let detail = {
            let state = self.store.snapshot();
            state
                .items
                .iter()
                .find(|record| record.id == id)
                .map(|record| NotificationDetail::capture(record, self.timezone))
        };
        self.selected = detail;
        self.selected.as_ref()
    }

    pub fn selected(&self) -> Option<&NotificationDetail> {
        self.selected.as_ref()
    }

    pub fn close_detail(&mut self) {
        self.selected = None;
    }
}
