use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use portal_notifications::models::{NotificationInput, NotificationRecord};

/// What the fake server saw
#[derive(Debug, Default)]
pub struct FakeBackendLog {
    pub list_queries: Vec<(usize, usize)>,
    pub bodies: Vec<NotificationInput>,
    pub deleted: Vec<i64>,
    pub authorization: Vec<Option<String>>,
}

#[derive(Clone)]
pub struct FakeBackend {
    pub records: Arc<Mutex<Vec<NotificationRecord>>>,
    pub log: Arc<Mutex<FakeBackendLog>>,
}

#[derive(Deserialize)]
struct ListQuery {
    skip: usize,
    limit: usize,
}

fn remember_auth(backend: &FakeBackend, headers: &HeaderMap) {
    let value = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    backend.log.lock().unwrap().authorization.push(value);
}

fn not_found(id: i64) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": format!("Notification {} not found", id) })),
    )
        .into_response()
}

async fn list(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Json<Vec<NotificationRecord>> {
    remember_auth(&backend, &headers);
    backend
        .log
        .lock()
        .unwrap()
        .list_queries
        .push((query.skip, query.limit));
    let records = backend.records.lock().unwrap();
    Json(
        records
            .iter()
            .skip(query.skip)
            .take(query.limit)
            .cloned()
            .collect(),
    )
}

async fn create(
    State(backend): State<FakeBackend>,
    Json(input): Json<NotificationInput>,
) -> Response {
    backend.log.lock().unwrap().bodies.push(input.clone());
    if input.title == "reject" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Title is not allowed" })),
        )
            .into_response();
    }
    let mut records = backend.records.lock().unwrap();
    let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
    let record = NotificationRecord {
        id,
        title: input.title,
        content: input.content,
        created_at: "2024-09-02T10:00:00".to_string(),
        updated_at: "2024-09-02T10:00:00".to_string(),
    };
    records.insert(0, record.clone());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn update(
    State(backend): State<FakeBackend>,
    Path(id): Path<i64>,
    Json(input): Json<NotificationInput>,
) -> Response {
    backend.log.lock().unwrap().bodies.push(input.clone());
    let mut records = backend.records.lock().unwrap();
    match records.iter_mut().find(|r| r.id == id) {
        Some(record) => {
            record.title = input.title;
            record.content = input.content;
            record.updated_at = "2024-09-03T10:00:00".to_string();
            Json(record.clone()).into_response()
        }
        None => not_found(id),
    }
}

async fn remove(State(backend): State<FakeBackend>, Path(id): Path<i64>) -> Response {
    backend.log.lock().unwrap().deleted.push(id);
    let mut records = backend.records.lock().unwrap();
    let before = records.len();
    records.retain(|r| r.id != id);
    if records.len() == before {
        return not_found(id);
    }
    StatusCode::NO_CONTENT.into_response()
}

/// Serve the notifications resource on an ephemeral port
pub async fn spawn_fake_backend(records: Vec<NotificationRecord>) -> (String, FakeBackend) {
    let backend = FakeBackend {
        records: Arc::new(Mutex::new(records)),
        log: Arc::new(Mutex::new(FakeBackendLog::default())),
    };

    let app = Router::new()
        .route("/notifications", get(list).post(create))
        .route("/notifications/:id", put(update).delete(remove))
        .with_state(backend.clone());

    let url = serve(app).await;
    (url, backend)
}

/// Serve a router that answers every list call with `status` and `body`
pub async fn spawn_static_backend(status: StatusCode, body: &'static str) -> String {
    let app = Router::new().route(
        "/notifications",
        get(move || async move { (status, body) }),
    );
    serve(app).await
}

/// Address nothing is listening on
pub async fn closed_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
