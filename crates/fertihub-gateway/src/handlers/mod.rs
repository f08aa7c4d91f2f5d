pub(crate) mod clinics;
pub(crate) mod consultation;
pub(crate) mod files;
pub(crate) mod patients;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use super::server::AppState;

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
