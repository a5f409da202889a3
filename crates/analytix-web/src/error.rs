use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use analytix_core::{RunError, SessionError};
use analytix_reporting::ExportError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Run(#[from] RunError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Run(RunError::NoInputSelected) => StatusCode::BAD_REQUEST,
            Self::Run(RunError::RunAlreadyInProgress) => StatusCode::CONFLICT,
            Self::Run(RunError::TaskFailed(_) | RunError::NoRuntime) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Session(SessionError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Session(_) => StatusCode::BAD_REQUEST,
            Self::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{self}");
        } else {
            log::debug!("{status}: {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_errors_map_to_client_statuses() {
        assert_eq!(
            ApiError::from(RunError::NoInputSelected).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(RunError::RunAlreadyInProgress).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(SessionError::EmptyName).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
