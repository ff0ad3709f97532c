use thiserror::Error;

const NETWORK_MESSAGE: &str = "Cannot reach the notification server. Please try again.";
const SERVER_MESSAGE: &str = "The notification server could not complete the request.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// No response was received (connection refused, DNS failure, timeout).
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },
    /// Rejected locally, before any request was made.
    #[error("Validation error: {0}")]
    Validation(String),
    /// Success status with a body that does not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl FeedError {
    /// Text suitable for showing to the person using the portal.
    pub fn user_message(&self) -> String {
        match self {
            FeedError::Network(_) => NETWORK_MESSAGE.to_string(),
            FeedError::Server {
                message: Some(message),
                ..
            } => message.clone(),
            FeedError::Server { message: None, .. } | FeedError::Decode(_) => {
                SERVER_MESSAGE.to_string()
            }
            FeedError::Validation(message) => message.clone(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, FeedError::Validation(_))
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
