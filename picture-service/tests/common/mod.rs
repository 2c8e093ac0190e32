#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use picture_service::models::Picture;
use picture_service::services::{seed::parse_seed, InsertOutcome, PictureStore};
use picture_service::{router, AppState};
use serde_json::{json, Value};
use service_core::error::AppError;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const SEED: &str = r#"[
    {"id": 1, "pic_url": "http://example.com/1.png", "event_country": "United States",
     "event_state": "Texas", "event_city": "Austin", "event_date": "5/18/2022"},
    {"id": 2, "pic_url": "http://example.com/2.png", "event_country": "United States",
     "event_state": "Ohio", "event_city": "Columbus", "event_date": "6/1/2022",
     "photographer": "unknown"},
    {"id": 3, "pic_url": "http://example.com/3.png", "event_country": "Canada",
     "event_state": "Quebec", "event_city": "Montreal", "event_date": "8/9/2022"}
]"#;

/// Mirrors the MongoDB store closely enough for handler tests: verbatim
/// seeding, generated ObjectIds, unique `id`.
#[derive(Default)]
pub struct InMemoryStore {
    documents: Mutex<Vec<Document>>,
}

fn id_of(document: &Document) -> Option<i64> {
    match document.get("id") {
        Some(Bson::Int32(v)) => Some(i64::from(*v)),
        Some(Bson::Int64(v)) => Some(*v),
        _ => None,
    }
}

fn with_storage_id(mut document: Document) -> Document {
    if !document.contains_key("_id") {
        document.insert("_id", ObjectId::new());
    }
    document
}

impl InMemoryStore {
    pub fn snapshot(&self, id: i64) -> Option<Document> {
        let documents = self.documents.lock().unwrap();
        documents.iter().find(|d| id_of(d) == Some(id)).cloned()
    }
}

#[async_trait]
impl PictureStore for InMemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn replace_all(&self, seed: Vec<Document>) -> Result<usize, AppError> {
        let mut documents = self.documents.lock().unwrap();
        *documents = seed.into_iter().map(with_storage_id).collect();
        Ok(documents.len())
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.documents.lock().unwrap().len() as u64)
    }

    async fn find_all(&self) -> Result<Vec<Document>, AppError> {
        Ok(self.documents.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Document>, AppError> {
        Ok(self.snapshot(id))
    }

    async fn insert(&self, picture: &Picture) -> Result<InsertOutcome, AppError> {
        let mut documents = self.documents.lock().unwrap();
        if documents.iter().any(|d| id_of(d) == Some(picture.id)) {
            return Ok(InsertOutcome::Duplicate);
        }
        let oid = ObjectId::new();
        let mut document = picture.to_document();
        document.insert("_id", oid);
        documents.push(document);
        Ok(InsertOutcome::Inserted(Bson::ObjectId(oid)))
    }

    async fn update(&self, id: i64, picture: &Picture) -> Result<(), AppError> {
        let mut documents = self.documents.lock().unwrap();
        if let Some(existing) = documents.iter_mut().find(|d| id_of(d) == Some(id)) {
            for (key, value) in picture.to_document() {
                existing.insert(key, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut documents = self.documents.lock().unwrap();
        let before = documents.len();
        documents.retain(|d| id_of(d) != Some(id));
        Ok(documents.len() < before)
    }
}

/// Every call fails as if MongoDB were unreachable.
pub struct UnavailableStore;

fn unavailable() -> AppError {
    AppError::DatabaseError(anyhow::anyhow!("server selection timeout"))
}

#[async_trait]
impl PictureStore for UnavailableStore {
    async fn ping(&self) -> Result<(), AppError> {
        Err(unavailable())
    }

    async fn replace_all(&self, _seed: Vec<Document>) -> Result<usize, AppError> {
        Err(unavailable())
    }

    async fn count(&self) -> Result<u64, AppError> {
        Err(unavailable())
    }

    async fn find_all(&self) -> Result<Vec<Document>, AppError> {
        Err(unavailable())
    }

    async fn find_by_id(&self, _id: i64) -> Result<Option<Document>, AppError> {
        Err(unavailable())
    }

    async fn insert(&self, _picture: &Picture) -> Result<InsertOutcome, AppError> {
        Err(unavailable())
    }

    async fn update(&self, _id: i64, _picture: &Picture) -> Result<(), AppError> {
        Err(unavailable())
    }

    async fn delete(&self, _id: i64) -> Result<bool, AppError> {
        Err(unavailable())
    }
}

/// Another writer created the same `id` between the existence lookup and the
/// insert: lookups miss, inserts hit the unique index.
pub struct ConcurrentCreateStore;

#[async_trait]
impl PictureStore for ConcurrentCreateStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn replace_all(&self, seed: Vec<Document>) -> Result<usize, AppError> {
        Ok(seed.len())
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(0)
    }

    async fn find_all(&self) -> Result<Vec<Document>, AppError> {
        Ok(Vec::new())
    }

    async fn find_by_id(&self, _id: i64) -> Result<Option<Document>, AppError> {
        Ok(None)
    }

    async fn insert(&self, _picture: &Picture) -> Result<InsertOutcome, AppError> {
        Ok(InsertOutcome::Duplicate)
    }

    async fn update(&self, _id: i64, _picture: &Picture) -> Result<(), AppError> {
        Ok(())
    }

    async fn delete(&self, _id: i64) -> Result<bool, AppError> {
        Ok(false)
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

impl TestApp {
    /// Router over an in-memory store seeded from `SEED`.
    pub async fn spawn() -> Self {
        Self::spawn_with_seed(SEED).await
    }

    pub async fn spawn_with_seed(seed: &str) -> Self {
        let store = Arc::new(InMemoryStore::default());
        let seed = parse_seed(seed).expect("Failed to parse test seed");
        picture_service::services::seed_store(store.as_ref(), seed)
            .await
            .expect("Failed to seed store");

        let router = router(AppState::new(store.clone()));
        TestApp { router, store }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<String>) -> TestResponse {
        send(&self.router, method, uri, body).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body.to_string())).await
    }

    pub async fn put_json(&self, uri: &str, body: &Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body.to_string())).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

pub async fn send(router: &Router, method: Method, uri: &str, body: Option<String>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .expect("Failed to build request");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request");

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn picture_json(id: i64, city: &str) -> Value {
    json!({
        "id": id,
        "pic_url": format!("http://example.com/{}.png", id),
        "event_country": "United States",
        "event_state": "Washington",
        "event_city": city,
        "event_date": "10/10/2022"
    })
}
