use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use fertihub_store::{ClinicId, NewPatient, Patient, PatientId};
use serde::Deserialize;

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PatientQuery {
    pub clinic_id: Option<ClinicId>,
}

pub(crate) async fn list_patients_handler(
    State(state): State<AppState>,
    Query(query): Query<PatientQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let patients = state
        .store
        .list_patients(query.clinic_id.as_ref())
        .await
        .map_err(|e| {
            tracing::error!("failed to fetch patients: {e}");
            ApiError::internal("Failed to fetch patients")
        })?;
    Ok(Json(patients))
}

pub(crate) async fn create_patient_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewPatient>, JsonRejection>,
) -> Result<Json<Patient>, ApiError> {
    let Json(new) = payload?;
    let patient = state
        .store
        .create_patient(new)
        .await
        .map_err(|e| ApiError::from(e).or_internal("Failed to create patient"))?;
    Ok(Json(patient))
}

pub(crate) async fn get_patient_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    state
        .store
        .patient(&PatientId(id))
        .await
        .map_err(|e| ApiError::from(e).or_internal("Failed to fetch patient"))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Patient not found"))
}

#[cfg(test)]
mod tests {
    use fertihub_llm::mock::MockProvider;
    use fertihub_store::{ClinicType, NewClinic};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::server::AppState;
    use crate::test_support::{body_json, get, json_request, router_from, state};

    async fn with_clinic() -> (AppState, String) {
        let st = state(MockProvider::default()).await;
        let clinic = st
            .store
            .create_clinic(NewClinic {
                name: "Rural Fertility Clinic".into(),
                clinic_type: ClinicType::Level1,
                location: "Pune, Maharashtra".into(),
                ai_provider: fertihub_llm::ProviderKind::Gemini,
                ai_api_key: None,
                hub_clinic_id: None,
            })
            .await
            .unwrap();
        (st, clinic.id.to_string())
    }

    fn sunita(clinic_id: &str) -> serde_json::Value {
        json!({
            "mrn": "P001",
            "name": "Sunita Desai",
            "age": 32,
            "phone": "+91 98765 43210",
            "location": "Pune, Maharashtra",
            "medicalHistory": {"chiefComplaint": "Primary infertility for 2 years"},
            "clinicId": clinic_id
        })
    }

    #[tokio::test]
    async fn create_list_and_get() {
        let (st, clinic_id) = with_clinic().await;
        let app = router_from(st);

        let resp = app
            .clone()
            .oneshot(json_request("POST", "/api/patients", &sunita(&clinic_id)))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let created = body_json(resp).await;
        let id = created["id"].as_str().unwrap().to_owned();
        assert_eq!(created["mrn"], "P001");

        let resp = app
            .clone()
            .oneshot(get(&format!("/api/patients?clinicId={clinic_id}")))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);

        let resp = app
            .clone()
            .oneshot(get("/api/patients?clinicId=other"))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await, json!([]));

        let resp = app
            .clone()
            .oneshot(get(&format!("/api/patients/{id}")))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(body_json(resp).await["name"], "Sunita Desai");

        let resp = app.oneshot(get("/api/patients/missing")).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn duplicate_mrn_is_409() {
        let (st, clinic_id) = with_clinic().await;
        let app = router_from(st);
        let first = app
            .clone()
            .oneshot(json_request("POST", "/api/patients", &sunita(&clinic_id)))
            .await
            .unwrap();
        assert_eq!(first.status(), 200);
        let second = app
            .oneshot(json_request("POST", "/api/patients", &sunita(&clinic_id)))
            .await
            .unwrap();
        assert_eq!(second.status(), 409);
    }

    #[tokio::test]
    async fn unknown_clinic_is_400() {
        let (st, _) = with_clinic().await;
        let resp = router_from(st)
            .oneshot(json_request("POST", "/api/patients", &sunita("nope")))
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }
}
