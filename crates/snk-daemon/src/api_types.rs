//! Daemon-only response types and the error-to-HTTP mapping.
//!
//! Request/response bodies shared with the CLI live in `snk_schemas::api`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use snk_db::{StoreError, StoreErrorKind};
use snk_schemas::api::ErrorResponse;

pub const CODE_INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    /// Backend name reported by the store ("postgres" | "memory").
    pub storage: String,
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Non-standard "client closed request", used for cancelled calls.
const CLIENT_CLOSED_REQUEST: u16 = 499;

pub fn status_for(kind: StoreErrorKind) -> StatusCode {
    match kind {
        StoreErrorKind::AlreadyExists => StatusCode::CONFLICT,
        StoreErrorKind::NotFound => StatusCode::NOT_FOUND,
        StoreErrorKind::ForeignKeyViolation => StatusCode::PRECONDITION_FAILED,
        StoreErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        StoreErrorKind::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        StoreErrorKind::Cancelled => StatusCode::from_u16(CLIENT_CLOSED_REQUEST)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        StoreErrorKind::Other => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_body(err: &StoreError) -> ErrorResponse {
    ErrorResponse {
        code: err.kind().as_str().to_string(),
        error: err.message().to_string(),
    }
}

/// Handler error: a status code plus the JSON body the CLI decodes.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                code: CODE_INVALID_ARGUMENT.to_string(),
                error: msg.into(),
            },
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self {
            status: status_for(err.kind()),
            body: error_body(&err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
