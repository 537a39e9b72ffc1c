use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use olg_core::{AdvanceError, AgentError, DecisionError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] crate::ConfigError),
    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pending: Option<Vec<String>>,
}

/// A failed request: status code plus a `{ "success": false, "error" }` body.
#[derive(Debug)]
pub struct HttpApiError {
    status: StatusCode,
    error: String,
    pending: Option<Vec<String>>,
}

impl HttpApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            pending: None,
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "professor access required")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<DecisionError> for HttpApiError {
    fn from(err: DecisionError) -> Self {
        match err {
            DecisionError::UnknownAgent(_) => Self::not_found(err.to_string()),
            other => Self::bad_request(other.to_string()),
        }
    }
}

impl From<AgentError> for HttpApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::AlreadyExists(_) => Self::new(StatusCode::CONFLICT, err.to_string()),
            AgentError::NotFound(_) => Self::not_found(err.to_string()),
        }
    }
}

impl From<AdvanceError> for HttpApiError {
    fn from(err: AdvanceError) -> Self {
        let AdvanceError::PendingHumans { pending } = &err;
        Self {
            status: StatusCode::CONFLICT,
            pending: Some(pending.iter().map(ToString::to_string).collect()),
            error: err.to_string(),
        }
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.error,
            pending: self.pending,
        };
        (self.status, Json(body)).into_response()
    }
}
