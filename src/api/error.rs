use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::backend::BackendError;
use crate::services::{AdminError, AuthError, CatalogError, FetchError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    Unauthorized(String),

    Forbidden(String),

    Conflict(String),

    /// The data service failed; the message is already safe to show.
    Upstream(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        ApiError::Upstream(err.0.to_string())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            CatalogError::Fetch(e) => e.into(),
        }
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Validation(msg) => ApiError::ValidationError(msg),
            AdminError::Upload(msg) => ApiError::Upstream(msg.to_string()),
            AdminError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            AdminError::Fetch(e) => e.into(),
            AdminError::Backend(e) => ApiError::from(e),
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            BackendError::InvalidQuery(msg) => ApiError::ValidationError(msg),
            other => {
                tracing::error!(error = %other, "Data service request failed");
                ApiError::Upstream("Failed to save changes. Please try again later.".to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::Unauthorized => ApiError::Unauthorized("Not authenticated".to_string()),
            AuthError::SignupDisabled => ApiError::Forbidden(err.to_string()),
            AuthError::AlreadyExists => ApiError::Conflict(err.to_string()),
            AuthError::Validation(msg) => ApiError::ValidationError(msg),
            AuthError::Provider(msg) => {
                tracing::warn!("Auth provider error: {}", msg);
                ApiError::Upstream("Authentication service is unavailable".to_string())
            }
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_failures_keep_their_message() {
        let err = ApiError::from(AdminError::Upload(
            crate::services::admin::IMAGE_UPLOAD_ERROR,
        ));
        assert!(matches!(
            err,
            ApiError::Upstream(ref m) if m == "Failed to upload image. Please try again later."
        ));
    }

    #[test]
    fn admin_reads_and_writes_report_distinct_messages() {
        let read = ApiError::from(AdminError::Fetch(FetchError(
            crate::services::catalog_store::MODELS_ERROR,
        )));
        assert!(matches!(
            read,
            ApiError::Upstream(ref m) if m == "Failed to fetch models. Please try again later."
        ));

        let write = ApiError::from(AdminError::Backend(BackendError::Status {
            status: 503,
            message: "unavailable".to_string(),
        }));
        assert!(matches!(
            write,
            ApiError::Upstream(ref m) if m == "Failed to save changes. Please try again later."
        ));
    }

    #[test]
    fn backend_not_found_maps_to_404() {
        let response =
            ApiError::from(BackendError::NotFound("category 4".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
