use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use fertihub_llm::mock::MockProvider;
use fertihub_llm::{AnyProvider, ProviderSet};
use fertihub_storage::ObjectStore;
use fertihub_store::SqliteStore;
use http_body_util::BodyExt;

use crate::router::{RouterConfig, build_router};
use crate::server::{AiSettings, AppState};

pub(crate) async fn store() -> SqliteStore {
    SqliteStore::new(":memory:")
        .await
        .expect("in-memory store")
        .with_password_iterations(1_000)
}

pub(crate) fn providers(mock: MockProvider) -> ProviderSet {
    ProviderSet::new(AnyProvider::Mock(mock.clone()), AnyProvider::Mock(mock))
}

pub(crate) async fn state(mock: MockProvider) -> AppState {
    AppState {
        store: store().await,
        providers: providers(mock),
        object_store: None,
        ai: AiSettings::default(),
        started_at: Instant::now(),
    }
}

pub(crate) async fn router(mock: MockProvider) -> Router {
    router_with(mock, RouterConfig::default()).await
}

pub(crate) async fn router_with(mock: MockProvider, config: RouterConfig) -> Router {
    build_router(state(mock).await, config)
}

pub(crate) fn router_from(state: AppState) -> Router {
    build_router(state, RouterConfig::default())
}

pub(crate) fn with_object_store(mut state: AppState, store: ObjectStore) -> AppState {
    state.object_store = Some(Arc::new(store));
    state
}

pub(crate) fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serializable body")))
        .expect("valid request")
}

pub(crate) fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

pub(crate) async fn body_bytes(resp: Response) -> Vec<u8> {
    resp.into_body()
        .collect()
        .await
        .expect("response body")
        .to_bytes()
        .to_vec()
}

pub(crate) async fn body_json(resp: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(resp).await).expect("json body")
}
