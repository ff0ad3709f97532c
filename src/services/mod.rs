pub mod feed_presenter;
pub mod formatting;
pub mod management_presenter;
pub mod notification_store;

pub use feed_presenter::{FeedEntry, FeedPresenter, NotificationDetail};
pub use formatting::{format_timestamp, preview, segment_content, ContentSegment};
pub use management_presenter::{ActionStatus, DeleteOutcome, ManagementPresenter, MutationKind};
pub use notification_store::{FeedPhase, FeedState, LoadOutcome, NotificationStore, SkipReason};
