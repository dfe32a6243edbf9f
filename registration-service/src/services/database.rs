use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, IndexModel,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;

use crate::config::MongoConfig;
use crate::models::{NewRegistration, Registration, RegistrationDocument};
use crate::services::{RegistrationStore, StoreConnection};

#[derive(Clone)]
pub struct MongoRegistrationStore {
    client: MongoClient,
    collection: Collection<RegistrationDocument>,
}

impl MongoRegistrationStore {
    /// Builds the client and confirms the deployment answers a `ping`.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, collection = %collection, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        let store = Self {
            collection: client.database(database).collection(collection),
            client,
        };
        store.ping().await?;

        tracing::info!(database = %database, collection = %collection, "Successfully connected to MongoDB");
        Ok(store)
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB ping failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        // Descending on created_at, matching the listing order
        let created_index = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("created_at_idx".to_string())
                    .build(),
            )
            .build();

        self.collection
            .create_index(created_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create created_at index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        Ok(())
    }
}

#[async_trait]
impl RegistrationStore for MongoRegistrationStore {
    async fn insert(&self, registration: NewRegistration) -> Result<Registration, AppError> {
        let document = registration.into_document(Utc::now());

        let result = self
            .collection
            .insert_one(&document, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert registration: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let id = match result.inserted_id {
            Bson::ObjectId(id) => id,
            other => {
                return Err(AppError::DatabaseError(anyhow::anyhow!(
                    "unexpected inserted id: {}",
                    other
                )))
            }
        };

        Ok(document.into_registration(id))
    }

    async fn list_newest_first(&self) -> Result<Vec<Registration>, AppError> {
        let find_options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self
            .collection
            .find(None, find_options)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list registrations: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let documents: Vec<RegistrationDocument> = cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect registrations: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        Ok(documents.into_iter().map(Registration::from).collect())
    }

    async fn count(&self) -> Result<u64, AppError> {
        self.collection
            .count_documents(None, None)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e.to_string())))
    }
}

/// Makes the startup connection attempt. Never fails: an unreachable
/// deployment yields `StoreConnection::Disconnected` for the rest of the
/// process lifetime. A non-zero `connect_retry_window` retries with
/// exponential backoff until the window elapses.
pub async fn connect_store(config: &MongoConfig) -> StoreConnection {
    let result = if config.connect_retry_window.is_zero() {
        connect_once(config).await
    } else {
        let policy = ExponentialBackoff {
            max_elapsed_time: Some(config.connect_retry_window),
            ..Default::default()
        };
        retry(policy, move || async move {
            connect_once(config).await.map_err(|e| {
                tracing::warn!(error = %e, "MongoDB connection attempt failed, retrying");
                backoff::Error::transient(e)
            })
        })
        .await
    };

    match result {
        Ok(store) => {
            if let Err(e) = store.initialize_indexes().await {
                tracing::warn!(error = %e, "Continuing without created_at index");
            }
            match store.count().await {
                Ok(count) => tracing::info!(documents = count, "Registration collection ready"),
                Err(e) => tracing::warn!(error = %e, "Failed to count existing registrations"),
            }
            StoreConnection::connected(store)
        }
        Err(e) => {
            tracing::error!(error = %e, "MongoDB connection failed, serving in disconnected mode");
            StoreConnection::Disconnected
        }
    }
}

async fn connect_once(config: &MongoConfig) -> Result<MongoRegistrationStore, AppError> {
    MongoRegistrationStore::connect(
        config.uri.expose_secret(),
        &config.database,
        &config.collection,
    )
    .await
}
