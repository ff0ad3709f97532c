use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;
use crate::domain::errors::{FeedError, FeedResult};
use crate::domain::ports::notification_api::NotificationApi;
use crate::models::{NotificationInput, NotificationRecord};

/// Longest server body kept as an error message
const MAX_ERROR_BODY: usize = 500;

/// reqwest implementation of the notifications port
#[derive(Clone)]
pub struct HttpNotificationApi {
    http_client: Client,
    notifications_url: String,
    api_token: Option<String>,
}

impl HttpNotificationApi {
    pub fn new(config: &Config) -> FeedResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| FeedError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            notifications_url: config.notifications_url(),
            api_token: config.api_token.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> FeedResult<Response> {
        let response = self.authorized(request).send().await.map_err(|e| {
            let error_msg = if e.is_timeout() {
                format!("Request timed out: {}", e)
            } else if e.is_connect() {
                format!("Connection failed: {}", e)
            } else {
                format!("Network error: {}", e)
            };
            warn!("Notifications request failed: {}", error_msg);
            FeedError::Network(error_msg)
        })?;

        let status = response.status();
        debug!("Notifications backend returned status {}", status.as_u16());

        if status.is_success() {
            return Ok(response);
        }

        let message = match response.text().await {
            Ok(body) => extract_error_message(&body),
            Err(_) => None,
        };
        Err(FeedError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> FeedResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/{}", self.notifications_url, id)
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn list_notifications(
        &self,
        skip: usize,
        limit: usize,
    ) -> FeedResult<Vec<NotificationRecord>> {
        let request = self
            .http_client
            .get(&self.notifications_url)
            .query(&[("skip", skip), ("limit", limit)]);
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    async fn create_notification(
        &self,
        input: &NotificationInput,
    ) -> FeedResult<NotificationRecord> {
        let request = self.http_client.post(&self.notifications_url).json(input);
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    async fn update_notification(
        &self,
        id: i64,
        input: &NotificationInput,
    ) -> FeedResult<NotificationRecord> {
        let request = self.http_client.put(self.item_url(id)).json(input);
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    async fn delete_notification(&self, id: i64) -> FeedResult<()> {
        let request = self.http_client.delete(self.item_url(id));
        self.send(request).await?;
        Ok(())
    }
}

/// Pull a human readable message out of an error body.
///
/// Understands a bare JSON string and objects with a `detail`, `message`,
/// `error` or `msg` field, falling back to the raw body text otherwise.
pub fn extract_error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let serde_json::Value::String(text) = &value {
            let text = text.trim();
            return (!text.is_empty()).then(|| text.to_string());
        }
        for key in ["detail", "message", "error", "msg"] {
            match value.get(key) {
                Some(serde_json::Value::String(text)) if !text.trim().is_empty() => {
                    return Some(text.trim().to_string());
                }
                // Validation failures come back as a list of {"msg": ...}
                Some(serde_json::Value::Array(items)) => {
                    let messages: Vec<&str> = items
                        .iter()
                        .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                        .collect();
                    if !messages.is_empty() {
                        return Some(messages.join("; "));
                    }
                }
                _ => {}
            }
        }
    }

    let mut text: String = body.chars().take(MAX_ERROR_BODY).collect();
    if body.chars().count() > MAX_ERROR_BODY {
        text.push_str("...");
    }
    Some(text)
}
