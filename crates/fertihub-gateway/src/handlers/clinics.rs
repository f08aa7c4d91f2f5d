use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use fertihub_store::{Clinic, ClinicId, ClinicWithLinks, NewClinic};

use crate::error::ApiError;
use crate::server::AppState;

pub(crate) async fn list_clinics_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClinicWithLinks>>, ApiError> {
    let clinics = state.store.list_clinics().await.map_err(|e| {
        tracing::error!("failed to fetch clinics: {e}");
        ApiError::internal("Failed to fetch clinics")
    })?;
    Ok(Json(clinics))
}

pub(crate) async fn create_clinic_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewClinic>, JsonRejection>,
) -> Result<Json<Clinic>, ApiError> {
    let Json(new) = payload?;
    let clinic = state
        .store
        .create_clinic(new)
        .await
        .map_err(|e| ApiError::from(e).or_internal("Failed to create clinic"))?;
    Ok(Json(clinic))
}

pub(crate) async fn get_clinic_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ClinicWithLinks>, ApiError> {
    state
        .store
        .clinic_with_links(&ClinicId(id))
        .await
        .map_err(|e| ApiError::from(e).or_internal("Failed to fetch clinic"))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Clinic not found"))
}
