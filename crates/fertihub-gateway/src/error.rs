use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to bind {0}: {1}")]
    Bind(String, std::io::Error),
    #[error("server error: {0}")]
    Server(String),
}

/// Error returned by route handlers, rendered as `{"error": message}`.
///
/// `message` is what the caller sees; internal causes are logged where the
/// error is built and never copied into the body.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub(crate) fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<fertihub_store::StoreError> for ApiError {
    /// Caller-facing store errors keep their message; everything else becomes
    /// an opaque 500 that the handler replaces with its own text.
    fn from(err: fertihub_store::StoreError) -> Self {
        use fertihub_store::StoreError;
        match err {
            StoreError::Validation(msg) => Self::bad_request(msg),
            StoreError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            StoreError::NotFound { entity, id } => Self::not_found(format!("{entity} {id} not found")),
            other => {
                tracing::error!("store error: {other}");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        // Undeserializable bodies are plain client errors here, not 422s
        let status = match rejection.status() {
            StatusCode::UNPROCESSABLE_ENTITY => StatusCode::BAD_REQUEST,
            other => other,
        };
        Self::new(status, rejection.body_text())
    }
}

impl ApiError {
    /// Replace the body of a 500 with a route-specific message.
    pub(crate) fn or_internal(self, message: &str) -> Self {
        if self.status == StatusCode::INTERNAL_SERVER_ERROR {
            Self::internal(message)
        } else {
            self
        }
    }

    #[cfg(test)]
    pub(crate) fn status(&self) -> StatusCode {
        self.status
    }
}
