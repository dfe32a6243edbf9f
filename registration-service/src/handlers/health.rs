use axum::{extract::State, Json};
use chrono::Utc;

use crate::dtos::HealthResponse;
use crate::models::format_timestamp;
use crate::startup::AppState;

/// Always answers 200; storage problems show up in the body only.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let mongodb = state.store.status();
    let total_documents = state.store.count_or_zero().await;

    tracing::debug!(mongodb = %mongodb, total_documents, "Health check");

    Json(HealthResponse {
        ok: true,
        mongodb,
        database: state.database.clone(),
        collection: state.collection.clone(),
        total_documents,
        timestamp: format_timestamp(Utc::now()),
    })
}
