//! REST API types and error mapping.
//!
//! Error bodies have the shape `{"detail": "..."}`. Caller identity is read
//! from headers set by the upstream authenticator.

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::logs::log_error;
use crate::error::{PipelineError, ServerError};
use crate::models::Owner;

/// Header carrying the caller id (required).
pub const OWNER_ID_HEADER: &str = "x-owner-id";
/// Header carrying the caller email.
pub const OWNER_EMAIL_HEADER: &str = "x-owner-email";
/// Header carrying the caller display name.
pub const OWNER_NAME_HEADER: &str = "x-owner-name";
/// Header flagging a superuser (`true` / `1`).
pub const OWNER_SUPERUSER_HEADER: &str = "x-owner-superuser";

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            service: "contactload".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Create an error body
pub fn error_response(detail: &str) -> Value {
    json!({ "detail": detail })
}

/// Build the caller identity from request headers.
pub fn owner_from_headers(headers: &HeaderMap) -> Result<Owner, ServerError> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let id = header(OWNER_ID_HEADER).ok_or(ServerError::Unauthorized)?;
    let superuser = header(OWNER_SUPERUSER_HEADER)
        .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1");

    Ok(Owner {
        email: header(OWNER_EMAIL_HEADER).unwrap_or_default(),
        full_name: header(OWNER_NAME_HEADER),
        is_superuser: superuser,
        id,
    })
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Pipeline(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = if status.is_server_error() {
            // Keep internals out of the response body
            log_error(format!("❌ {}", self));
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(error_response(&detail))).into_response()
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl From<crate::error::ImportError> for ServerError {
    fn from(err: crate::error::ImportError) -> Self {
        ServerError::Pipeline(PipelineError::Import(err))
    }
}
