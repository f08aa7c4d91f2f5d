use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use fertihub_storage::{ObjectStore, StorageError};
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::server::AppState;

const FILE_FIELD: &str = "file";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

struct UploadedFile {
    name: String,
    content_type: String,
    bytes: Vec<u8>,
}

fn object_store(state: &AppState) -> Result<Arc<ObjectStore>, ApiError> {
    state
        .object_store
        .clone()
        .ok_or_else(|| ApiError::unavailable("File storage is not configured"))
}

fn storage_error(err: &StorageError, message: &str) -> ApiError {
    match err {
        StorageError::InvalidKey(_) => ApiError::bad_request("Invalid file key"),
        _ => {
            tracing::error!("{message}: {err}");
            ApiError::internal(message)
        }
    }
}

async fn read_file_field(mut multipart: Multipart) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_owned();
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        return Ok(Some(UploadedFile {
            name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

pub(crate) async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::new(e.status(), e.body_text()))?;
    let file = read_file_field(multipart)
        .await?
        .ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let store = object_store(&state)?;

    let url = store
        .upload(file.bytes, &file.name, &file.content_type)
        .await
        .map_err(|e| storage_error(&e, "Failed to upload file"))?;
    Ok(Json(json!({ "url": url })))
}

pub(crate) async fn download_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let store = object_store(&state)?;
    let object = store
        .download(&key)
        .await
        .map_err(|e| storage_error(&e, "Failed to retrieve file"))?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let content_type = object
        .content_type
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned());
    Ok(([(CONTENT_TYPE, content_type)], object.bytes).into_response())
}

pub(crate) async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let store = object_store(&state)?;
    store
        .delete(&key)
        .await
        .map_err(|e| storage_error(&e, "Failed to delete file"))?;
    Ok(Json(json!({ "deleted": true })))
}
