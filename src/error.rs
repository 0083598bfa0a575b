use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Everything a handler can fail with. Error bodies are plain text, success
/// bodies are JSON.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Access Denied")]
    AuthMissing,

    #[error("Forbidden")]
    AuthInvalid,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    QuotaExceeded(&'static str),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The message is what the client sees; the cause is only logged.
    #[error("{0}")]
    Persistence(&'static str),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthMissing => StatusCode::UNAUTHORIZED,
            AppError::AuthInvalid => StatusCode::FORBIDDEN,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::QuotaExceeded(_) => StatusCode::FORBIDDEN,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Logs a store failure and hides it behind `msg`.
    pub fn persistence(msg: &'static str, err: anyhow::Error) -> Self {
        tracing::error!(error = %crate::unpack_error(&*err), "{}", msg);
        AppError::Persistence(msg)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_body() {
        let cases = [
            (AppError::AuthMissing, StatusCode::UNAUTHORIZED, "Access Denied"),
            (AppError::AuthInvalid, StatusCode::FORBIDDEN, "Forbidden"),
            (AppError::NotFound("Collection"), StatusCode::NOT_FOUND, "Collection not found"),
            (
                AppError::QuotaExceeded("Collection limit reached"),
                StatusCode::FORBIDDEN,
                "Collection limit reached",
            ),
            (
                AppError::InvalidRequest("missing field `url`".to_string()),
                StatusCode::BAD_REQUEST,
                "Invalid request: missing field `url`",
            ),
        ];

        for (err, status, body) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.to_string(), body);
        }
    }
}
