use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use fertihub_core::{ConsultationError, ConsultationOutcome, ConsultationService, Phase};
use fertihub_llm::ProviderKind;
use fertihub_store::ClinicId;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::server::AppState;

const FAILED: &str = "Failed to process AI consultation";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConsultationRequest {
    #[serde(default)]
    pub phase: Value,
    #[serde(default)]
    pub patient_data: Value,
    #[serde(default)]
    pub ai_provider: Option<String>,
    #[serde(default)]
    pub clinic_id: Option<ClinicId>,
}

pub(crate) async fn consultation_handler(
    State(state): State<AppState>,
    payload: Result<Json<ConsultationRequest>, JsonRejection>,
) -> Result<Json<ConsultationOutcome>, ApiError> {
    let Json(request) = payload?;

    let phase: Phase = request
        .phase
        .as_str()
        .and_then(|name| name.parse().ok())
        .ok_or_else(|| ApiError::bad_request("Invalid phase"))?;

    let clinic = match &request.clinic_id {
        Some(id) => Some(
            state
                .store
                .clinic(id)
                .await
                .map_err(|e| ApiError::from(e).or_internal(FAILED))?
                .ok_or_else(|| ApiError::not_found("Clinic not found"))?,
        ),
        None => None,
    };

    let kind = match request.ai_provider.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name
            .parse::<ProviderKind>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        _ => clinic
            .as_ref()
            .map_or(state.ai.default_provider, |c| c.ai_provider),
    };

    let base = state.providers.get(kind);
    let clinic_key = clinic
        .as_ref()
        .filter(|c| c.ai_provider == kind)
        .and_then(|c| c.ai_api_key.as_ref());
    let provider = match clinic_key {
        Some(key) => base.with_api_key(key.expose()),
        None => base.clone(),
    };

    let service = ConsultationService::new(provider).with_fallback(state.ai.fallback_enabled);
    match service.run(phase, &request.patient_data).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(ConsultationError::InvalidPatientData(msg)) => Err(ApiError::bad_request(msg)),
        Err(e) if e.is_provider_failure() => {
            tracing::error!(%phase, %kind, "consultation failed: {e}");
            Err(ApiError::new(
                StatusCode::BAD_GATEWAY,
                format!("AI provider {kind} failed to respond"),
            ))
        }
        Err(e) => {
            tracing::error!(%phase, "consultation failed: {e}");
            Err(ApiError::internal(FAILED))
        }
    }
}
