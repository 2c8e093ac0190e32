//! Startup seeding: load the static seed file and replace the collection
//! contents with it.

use crate::services::{metrics::record_seeded, PictureStore};
use mongodb::bson::{self, Document};
use serde_json::Value;
use service_core::error::AppError;
use std::path::Path;

/// Read and parse the seed file. Fails if the file is missing, is not JSON,
/// is not an array, or holds a non-object element.
pub async fn load_seed_file(path: &Path) -> Result<Vec<Document>, AppError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        tracing::error!("Failed to read seed file {}: {}", path.display(), e);
        AppError::SeedError(anyhow::anyhow!(
            "cannot read {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_seed(&raw).map_err(|e| {
        tracing::error!("Error loading JSON from {}: {}", path.display(), e);
        e
    })
}

pub fn parse_seed(raw: &str) -> Result<Vec<Document>, AppError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| AppError::SeedError(anyhow::anyhow!("invalid JSON: {}", e)))?;

    let Value::Array(items) = value else {
        return Err(AppError::SeedError(anyhow::anyhow!(
            "JSON must contain a list of documents."
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => bson::to_document(&fields).map_err(|e| {
                AppError::SeedError(anyhow::anyhow!("element {}: {}", index, e))
            }),
            other => Err(AppError::SeedError(anyhow::anyhow!(
                "element {} is not an object: {}",
                index,
                other
            ))),
        })
        .collect()
}

/// Wipe the collection and insert the seed documents verbatim.
pub async fn seed_store(store: &dyn PictureStore, seed: Vec<Document>) -> Result<usize, AppError> {
    let inserted = store.replace_all(seed).await.map_err(|e| {
        tracing::error!("Error inserting initial data: {}", e);
        e
    })?;

    record_seeded(inserted);
    tracing::info!("Initial {} documents inserted into the database.", inserted);
    Ok(inserted)
}
