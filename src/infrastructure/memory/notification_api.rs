use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore};

use crate::domain::errors::{FeedError, FeedResult};
use crate::domain::ports::notification_api::NotificationApi;
use crate::models::{NotificationInput, NotificationRecord};

/// A request as seen by the in-memory backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    List { skip: usize, limit: usize },
    Create(NotificationInput),
    Update(i64, NotificationInput),
    Delete(i64),
}

struct Inner {
    // Newest first, the order the list endpoint returns
    records: Vec<NotificationRecord>,
    next_id: i64,
    calls: Vec<ApiCall>,
    failures: VecDeque<FeedError>,
    list_gate: Option<Arc<Semaphore>>,
}

/// In-memory notifications backend.
///
/// Records every call, can be told to fail the next request, and can hold
/// list requests until the caller releases them.
pub struct InMemoryNotificationApi {
    inner: Mutex<Inner>,
}

impl InMemoryNotificationApi {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: Vec::new(),
                next_id: 1,
                calls: Vec::new(),
                failures: VecDeque::new(),
                list_gate: None,
            }),
        }
    }

    /// Backend holding `count` records with ids 1..=count, newest (highest id) first
    pub fn seeded(count: usize) -> Self {
        let records = (1..=count as i64)
            .rev()
            .map(|id| {
                let stamp = format!("2024-01-01T00:{:02}:{:02}", (id / 60) % 60, id % 60);
                NotificationRecord {
                    id,
                    title: format!("Notification {}", id),
                    content: format!("Content of notification {}", id),
                    created_at: stamp.clone(),
                    updated_at: stamp,
                }
            })
            .collect();

        Self {
            inner: Mutex::new(Inner {
                records,
                next_id: count as i64 + 1,
                calls: Vec::new(),
                failures: VecDeque::new(),
                list_gate: None,
            }),
        }
    }

    /// Every call received so far, in order
    pub async fn calls(&self) -> Vec<ApiCall> {
        self.inner.lock().await.calls.clone()
    }

    pub async fn list_calls(&self) -> usize {
        self.inner
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| matches!(call, ApiCall::List { .. }))
            .count()
    }

    /// Current server-side contents
    pub async fn records(&self) -> Vec<NotificationRecord> {
        self.inner.lock().await.records.clone()
    }

    /// Make the next request (of any kind) fail with `error`
    pub async fn fail_next(&self, error: FeedError) {
        self.inner.lock().await.failures.push_back(error);
    }

    /// Hold list requests until a permit is added to the returned semaphore
    pub async fn gate_lists(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.inner.lock().await.list_gate = Some(gate.clone());
        gate
    }

    async fn record_call(&self, call: ApiCall) -> FeedResult<()> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(call);
        match inner.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryNotificationApi {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(id: i64) -> FeedError {
    FeedError::Server {
        status: 404,
        message: Some(format!("Notification {} not found", id)),
    }
}

fn now_stamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[async_trait]
impl NotificationApi for InMemoryNotificationApi {
    async fn list_notifications(
        &self,
        skip: usize,
        limit: usize,
    ) -> FeedResult<Vec<NotificationRecord>> {
        self.record_call(ApiCall::List { skip, limit }).await?;

        let gate = self.inner.lock().await.list_gate.clone();
        match gate {
            Some(gate) => {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
            // Suspend once, like a real request would
            None => tokio::task::yield_now().await,
        }

        let inner = self.inner.lock().await;
        Ok(inner.records.iter().skip(skip).take(limit).cloned().collect())
    }

    async fn create_notification(
        &self,
        input: &NotificationInput,
    ) -> FeedResult<NotificationRecord> {
        self.record_call(ApiCall::Create(input.clone())).await?;

        let mut inner = self.inner.lock().await;
        let now = now_stamp();
        let record = NotificationRecord {
            id: inner.next_id,
            title: input.title.clone(),
            content: input.content.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        inner.next_id += 1;
        inner.records.insert(0, record.clone());
        Ok(record)
    }

    async fn update_notification(
        &self,
        id: i64,
        input: &NotificationInput,
    ) -> FeedResult<NotificationRecord> {
        self.record_call(ApiCall::Update(id, input.clone())).await?;

        let mut inner = self.inner.lock().await;
        let record = inner
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| not_found(id))?;
        record.title = input.title.clone();
        record.content = input.content.clone();
        record.updated_at = now_stamp();
        Ok(record.clone())
    }

    async fn delete_notification(&self, id: i64) -> FeedResult<()> {
        self.record_call(ApiCall::Delete(id)).await?;

        let mut inner = self.inner.lock().await;
        let before = inner.records.len();
        inner.records.retain(|record| record.id != id);
        if inner.records.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_order_is_newest_first() {
        let api = InMemoryNotificationApi::seeded(3);
        let ids: Vec<i64> = api.records().await.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_list_pages() {
        let api = InMemoryNotificationApi::seeded(5);
        let page = api.list_notifications(2, 2).await.unwrap();
        let ids: Vec<i64> = page.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2]);
        assert_eq!(api.list_notifications(5, 2).await.unwrap(), vec![]);
        assert_eq!(api.list_calls().await, 2);
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed() {
        let api = InMemoryNotificationApi::seeded(1);
        api.fail_next(FeedError::Network("down".to_string())).await;

        assert!(api.list_notifications(0, 20).await.is_err());
        assert!(api.list_notifications(0, 20).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let api = InMemoryNotificationApi::seeded(1);
        let input = NotificationInput::new("T", "C");

        let err = api.update_notification(99, &input).await.unwrap_err();
        assert!(matches!(err, FeedError::Server { status: 404, .. }));

        let err = api.delete_notification(99).await.unwrap_err();
        assert!(matches!(err, FeedError::Server { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_create_prepends() {
        let api = InMemoryNotificationApi::seeded(2);
        let created = api
            .create_notification(&NotificationInput::new("New", "Body"))
            .await
            .unwrap();

        assert_eq!(created.id, 3);
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(api.records().await[0].id, 3);
    }
}
