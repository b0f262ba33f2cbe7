use crate::domain::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use common::model::ErrorProto;
use common::model::ErrorResponse;

/// Error answered with the `{"error": {...}}` envelope of the Google APIs.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    reason: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, reason: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            reason,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "notFound", message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid", message)
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let (status, reason) = match &err {
            StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "notFound"),
            StoreError::AlreadyExists(_) => (StatusCode::CONFLICT, "alreadyExists"),
            StoreError::DuplicateJob(_) => (StatusCode::CONFLICT, "duplicate"),
            StoreError::Invalid { .. } => (StatusCode::BAD_REQUEST, "invalid"),
            StoreError::BackendError => (StatusCode::SERVICE_UNAVAILABLE, "backendError"),
        };

        Self::new(status, reason, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!("Answering {}: {}", self.status, self.message);

        let body = ErrorResponse::new(
            self.status.as_u16(),
            ErrorProto::new(self.reason, self.message),
        );

        (self.status, Json(body)).into_response()
    }
}
