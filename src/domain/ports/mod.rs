pub mod notification_api;
