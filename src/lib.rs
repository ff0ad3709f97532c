pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod models;
pub mod services;

pub use config::*;
pub use domain::errors::{FeedError, FeedResult};
pub use domain::ports::notification_api::NotificationApi;
pub use models::*;
pub use services::*;
