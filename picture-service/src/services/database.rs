use crate::config::MongoConfig;
use crate::models::Picture;
use crate::services::store::{InsertOutcome, PictureStore};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{
    bson::{doc, Document},
    options::{ClientOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use std::time::Duration;

const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);
const DUPLICATE_KEY_CODE: i32 = 11000;
const ID_INDEX_NAME: &str = "picture_id_unique";

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
    collection: String,
}

impl MongoDb {
    /// Connect and verify the server answers `ping`. Authentication failures
    /// come back as `AppError::AuthError`, anything else as `DatabaseError`.
    pub async fn connect(config: &MongoConfig) -> Result<Self, AppError> {
        tracing::info!(
            uri = %config.redacted_uri(),
            authenticated = config.is_authenticated(),
            "Connecting to MongoDB"
        );

        let mut client_options = ClientOptions::parse(config.connection_uri().expose_secret())
            .await
            .map_err(|e| {
                tracing::error!("Failed to parse MongoDB connection string: {}", e);
                AppError::ConfigError(e.into())
            })?;
        client_options.app_name = Some("picture-service".to_string());
        client_options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);

        let client = MongoClient::with_options(client_options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::from(e)
        })?;

        let mongo = Self {
            db: client.database(&config.database),
            client,
            collection: config.collection.clone(),
        };

        mongo.run_ping().await.map_err(|e| {
            let err = connection_error(e);
            match &err {
                AppError::AuthError(e) => tracing::error!("Authentication error: {}", e),
                other => tracing::error!("MongoDB connection error: {}", other),
            }
            err
        })?;

        tracing::info!(database = %config.database, "Connected to MongoDB successfully");
        Ok(mongo)
    }

    pub fn pictures(&self) -> Collection<Document> {
        self.db.collection(&self.collection)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Close pooled connections. Call after the HTTP server has stopped.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        tracing::info!("MongoDB client shut down");
    }

    async fn run_ping(&self) -> mongodb::error::Result<Document> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
    }

    async fn create_id_index(&self) -> Result<(), AppError> {
        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .name(ID_INDEX_NAME.to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.pictures()
            .create_index(id_index, None)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create unique id index on {} collection: {}",
                    self.collection,
                    e
                );
                AppError::from(e)
            })?;
        tracing::info!("Created unique index on {}.id", self.collection);
        Ok(())
    }
}

#[async_trait]
impl PictureStore for MongoDb {
    async fn ping(&self) -> Result<(), AppError> {
        self.run_ping().await.map_err(|e| {
            tracing::error!("MongoDB health check failed: {}", e);
            AppError::from(e)
        })?;
        Ok(())
    }

    async fn replace_all(&self, seed: Vec<Document>) -> Result<usize, AppError> {
        let collection = self.pictures();
        collection.drop(None).await?;

        let inserted = if seed.is_empty() {
            0
        } else {
            collection.insert_many(seed, None).await?.inserted_ids.len()
        };

        // Dropping the collection drops its indexes too.
        self.create_id_index().await?;
        Ok(inserted)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.pictures().count_documents(doc! {}, None).await?)
    }

    async fn find_all(&self) -> Result<Vec<Document>, AppError> {
        let cursor = self.pictures().find(doc! {}, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Document>, AppError> {
        Ok(self.pictures().find_one(doc! { "id": id }, None).await?)
    }

    async fn insert(&self, picture: &Picture) -> Result<InsertOutcome, AppError> {
        match self.pictures().insert_one(picture.to_document(), None).await {
            Ok(result) => Ok(InsertOutcome::Inserted(result.inserted_id)),
            Err(e) if is_duplicate_key(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, id: i64, picture: &Picture) -> Result<(), AppError> {
        self.pictures()
            .update_one(
                doc! { "id": id },
                doc! { "$set": picture.to_document() },
                None,
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = self.pictures().delete_one(doc! { "id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

fn connection_error(err: mongodb::error::Error) -> AppError {
    let authentication_failed = matches!(err.kind.as_ref(), ErrorKind::Authentication { .. });
    classify_connection_error(authentication_failed, err)
}

fn classify_connection_error(authentication_failed: bool, err: mongodb::error::Error) -> AppError {
    if authentication_failed {
        AppError::AuthError(err.into())
    } else {
        AppError::DatabaseError(err.into())
    }
}
