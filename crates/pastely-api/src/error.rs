use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pastely_db::ModelError;
use thiserror::Error;

/// Request-level failures. Validation failures never reach this type: the
/// handlers re-render the form themselves.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("malformed form submission: {0}")]
    ClientInput(String),

    #[error("resource not found")]
    NotFound,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ClientInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound | AppError::Model(ModelError::NoRecord) => StatusCode::NOT_FOUND,
            AppError::Model(_) | AppError::Template(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn log_error(&self) {
        match self.status_code() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(error = %self, "Not found");
            }
            code if code.is_client_error() => {
                tracing::warn!(error = %self, status_code = %code, "Client error");
            }
            code => {
                tracing::error!(
                    error = %self,
                    status_code = %code,
                    source = ?self.source(),
                    "Server error"
                );
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log_error();

        // Internals stay in the log; the client only sees the status text.
        let status = self.status_code();
        let body = status.canonical_reason().unwrap_or("Error");
        (status, body).into_response()
    }
}
