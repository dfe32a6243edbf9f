use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use service_core::error::AppError;

use crate::dtos::{CreateRegistrationResponse, ListRegistrationsResponse, RegistrationRequest};
use crate::services::{record_registration_created, record_registration_rejected};
use crate::startup::AppState;

#[tracing::instrument(skip(state, headers, body))]
pub async fn create_registration(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CreateRegistrationResponse>, AppError> {
    let store = state.store.store()?;

    let request = RegistrationRequest::from_body(&headers, &body).map_err(|e| {
        record_registration_rejected("malformed_body");
        e
    })?;

    let registration = request.normalize();
    registration.check_required().map_err(|e| {
        record_registration_rejected("missing_field");
        e
    })?;

    tracing::info!(
        full_name = %registration.full_name,
        personal_email = %registration.personal_email,
        company_name = %registration.company_name,
        company_email = %registration.company_email,
        accepted_terms = registration.accepted_terms,
        newsletter_opt_in = registration.newsletter_opt_in,
        database = %state.database,
        collection = %state.collection,
        "Inserting registration"
    );

    let stored = store.insert(registration).await?;
    record_registration_created();

    // Informational only; a failed count must not fail the submission.
    let total_documents = store.count().await.ok();
    tracing::info!(
        registration_id = %stored.id,
        created_at = %stored.created_at,
        total_documents = ?total_documents,
        "Registration saved"
    );

    Ok(Json(CreateRegistrationResponse::new(stored)))
}

#[tracing::instrument(skip(state))]
pub async fn list_registrations(
    State(state): State<AppState>,
) -> Result<Json<ListRegistrationsResponse>, AppError> {
    let registrations = state.store.store()?.list_newest_first().await?;

    tracing::info!(count = registrations.len(), "Retrieved registrations");

    Ok(Json(ListRegistrationsResponse::from(registrations)))
}
