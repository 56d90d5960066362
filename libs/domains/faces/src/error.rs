use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use core_config::ConfigError;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum FaceError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Face {id} has {actual} dimensions, collection expects {expected}")]
    DimensionMismatch {
        id: String,
        expected: u64,
        actual: usize,
    },

    #[error("Qdrant error: {0}")]
    Qdrant(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type FaceResult<T> = Result<T, FaceError>;

impl From<qdrant_client::QdrantError> for FaceError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        FaceError::Qdrant(err.to_string())
    }
}

impl From<validator::ValidationErrors> for FaceError {
    fn from(err: validator::ValidationErrors) -> Self {
        FaceError::Validation(err.to_string())
    }
}

impl From<ConfigError> for FaceError {
    fn from(err: ConfigError) -> Self {
        FaceError::Config(err.to_string())
    }
}

impl FaceError {
    /// Error code reported to clients and in logs
    pub fn code(&self) -> i32 {
        match self {
            FaceError::Validation(_) => 1001,
            FaceError::NotFound(_) => 1002,
            FaceError::DimensionMismatch { .. } => 1006,
            FaceError::Qdrant(_) => 2001,
            FaceError::Config(_) => 3001,
            FaceError::Internal(_) => 1005,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            FaceError::Validation(_) | FaceError::DimensionMismatch { .. } => {
                StatusCode::BAD_REQUEST
            }
            FaceError::NotFound(_) => StatusCode::NOT_FOUND,
            FaceError::Qdrant(_) | FaceError::Config(_) | FaceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Standard error body returned by the face API.
///
/// ```json
/// {
///   "code": 1006,
///   "error": "BadRequest",
///   "message": "Face ab12 has 3 dimensions, collection expects 512"
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
}

impl IntoResponse for FaceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (error, message) = if status.is_server_error() {
            tracing::error!(error_code = code, "Face store failure: {}", self);
            // Backend details stay in the logs
            (
                "InternalServerError",
                "An internal server error occurred".to_string(),
            )
        } else {
            tracing::info!(error_code = code, "Rejected face request: {}", self);
            let error = if status == StatusCode::NOT_FOUND {
                "NotFound"
            } else {
                "BadRequest"
            };
            (error, self.to_string())
        };

        let body = ErrorResponse {
            code,
            error: error.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
