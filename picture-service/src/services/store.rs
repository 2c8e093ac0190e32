use crate::models::Picture;
use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use service_core::error::AppError;

/// Result of an insert against a collection with a unique `id`.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// Storage identifier assigned to the new document.
    Inserted(Bson),
    /// Another document already holds this `id`.
    Duplicate,
}

/// Point operations the HTTP handlers need from the picture collection.
///
/// Documents are returned as raw BSON so seeded records with extra or oddly
/// typed fields still round-trip to clients.
#[async_trait]
pub trait PictureStore: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;

    /// Drop every document and insert `seed` verbatim. Returns the number
    /// inserted.
    async fn replace_all(&self, seed: Vec<Document>) -> Result<usize, AppError>;

    async fn count(&self) -> Result<u64, AppError>;

    async fn find_all(&self) -> Result<Vec<Document>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Document>, AppError>;

    async fn insert(&self, picture: &Picture) -> Result<InsertOutcome, AppError>;

    /// Overwrite the six fields of the document whose `id` equals `id`.
    async fn update(&self, id: i64, picture: &Picture) -> Result<(), AppError>;

    /// Returns false when nothing matched.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}
