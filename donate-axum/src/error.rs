use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use donate_mailer::MailerError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<donate_core::Error> for AuthError {
    fn from(err: donate_core::Error) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

impl From<MailerError> for AuthError {
    fn from(err: MailerError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AuthError::InternalError(ref msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
