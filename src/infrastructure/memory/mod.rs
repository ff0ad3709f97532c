pub mod notification_api;

pub use notification_api::{ApiCall, InMemoryNotificationApi};
