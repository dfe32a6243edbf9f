use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;
use std::sync::{Arc, Mutex};

use crate::models::{NewRegistration, Registration};
use crate::services::RegistrationStore;

/// Process-local store, used in tests and local runs without MongoDB.
#[derive(Clone, Default)]
pub struct InMemoryRegistrationStore {
    records: Arc<Mutex<Vec<Registration>>>,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<std::sync::MutexGuard<'_, Vec<Registration>>, AppError> {
        self.records
            .lock()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("registration store poisoned")))
    }
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn insert(&self, registration: NewRegistration) -> Result<Registration, AppError> {
        let stored = registration
            .into_document(Utc::now())
            .into_registration(ObjectId::new());
        self.records()?.push(stored.clone());
        Ok(stored)
    }

    async fn list_newest_first(&self) -> Result<Vec<Registration>, AppError> {
        let mut records = self.records()?.clone();
        // Reverse first so the stable sort keeps later inserts ahead on ties.
        records.reverse();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.records()?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(name: &str) -> NewRegistration {
        NewRegistration {
            full_name: name.to_string(),
            personal_email: format!("{}@example.com", name.to_lowercase()),
            company_name: String::new(),
            company_email: String::new(),
            accepted_terms: true,
            newsletter_opt_in: false,
        }
    }

    #[tokio::test]
    async fn insert_assigns_distinct_identifiers() {
        let store = InMemoryRegistrationStore::new();

        let first = store.insert(registration("Ada")).await.unwrap();
        let second = store.insert(registration("Grace")).await.unwrap();

        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let store = InMemoryRegistrationStore::new();
        for name in ["Ada", "Grace", "Margaret"] {
            store.insert(registration(name)).await.unwrap();
        }

        let names: Vec<String> = store
            .list_newest_first()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.full_name)
            .collect();

        assert_eq!(names, vec!["Margaret", "Grace", "Ada"]);
    }
}
