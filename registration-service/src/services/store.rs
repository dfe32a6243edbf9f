use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;

use crate::dtos::ConnectionStatus;
use crate::models::{NewRegistration, Registration};

/// Persistence contract for registrations.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Inserts one registration stamped with the current time and returns it
    /// with its assigned identifier.
    async fn insert(&self, registration: NewRegistration) -> Result<Registration, AppError>;

    /// Every stored registration, newest `created_at` first.
    async fn list_newest_first(&self) -> Result<Vec<Registration>, AppError>;

    async fn count(&self) -> Result<u64, AppError>;
}

/// Outcome of the startup connection attempt. Fixed for the process lifetime.
#[derive(Clone)]
pub enum StoreConnection {
    Connected(Arc<dyn RegistrationStore>),
    Disconnected,
}

impl StoreConnection {
    pub fn connected(store: impl RegistrationStore + 'static) -> Self {
        StoreConnection::Connected(Arc::new(store))
    }

    pub fn status(&self) -> ConnectionStatus {
        match self {
            StoreConnection::Connected(_) => ConnectionStatus::Connected,
            StoreConnection::Disconnected => ConnectionStatus::Disconnected,
        }
    }

    /// The store, or `StorageUnavailable` when the startup attempt failed.
    pub fn store(&self) -> Result<&Arc<dyn RegistrationStore>, AppError> {
        match self {
            StoreConnection::Connected(store) => Ok(store),
            StoreConnection::Disconnected => Err(AppError::StorageUnavailable),
        }
    }

    /// Document count for health reporting. Counting failures degrade to zero
    /// rather than failing the probe.
    pub async fn count_or_zero(&self) -> u64 {
        let StoreConnection::Connected(store) = self else {
            return 0;
        };

        match store.count().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to count registrations, reporting zero");
                0
            }
        }
    }
}
