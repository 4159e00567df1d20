use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failure of the remote repository publisher (repo creation, file
/// commit, issue creation, repo lookup).
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub returned {status} while trying to {action}")]
    Remote { action: &'static str, status: u16 },

    #[error("remote publisher capability is not available")]
    Unavailable,
}

/// Failure of a best-effort notification (webhook or email).
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("webhook POST failed: {0}")]
    Webhook(#[from] reqwest::Error),

    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build mail message: {0}")]
    Compose(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Request-level errors surfaced over HTTP.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Auth(&'static str),

    #[error("Invalid secret key")]
    InvalidSecret,

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Auth(_) | ApiError::InvalidSecret => StatusCode::UNAUTHORIZED,
            ApiError::Publish(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(json!({
                "status": "error",
                "message": self.to_string()
            })),
        )
            .into_response()
    }
}
