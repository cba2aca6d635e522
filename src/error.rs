//! Crate-wide error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::response::Envelope;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid login details")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Not enough stock")]
    OutOfStock,

    #[error("Payment verification failed")]
    VerificationFailed,

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Payment captured but stock exhausted; order needs manual remediation")]
    StockExhausted,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidRequest(_) | Error::OutOfStock | Error::VerificationFailed => {
                StatusCode::BAD_REQUEST
            }
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::StockExhausted => StatusCode::CONFLICT,
            Error::Gateway(_) | Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // 500s carry a generic message; the cause goes to the log only.
        let message = match &self {
            Error::Database(err) => {
                tracing::error!(error = %err, "database failure");
                "Internal server error".to_string()
            }
            Error::Gateway(detail) => {
                tracing::error!(%detail, "payment gateway failure");
                "Payment gateway error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(Envelope::<()>::fail(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rule_failures_map_to_4xx() {
        assert_eq!(
            Error::InvalidRequest("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::OutOfStock.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::VerificationFailed.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::NotFound("Product").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::StockExhausted.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn gateway_failures_map_to_500() {
        assert_eq!(
            Error::Gateway("timeout".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_names_the_entity() {
        assert_eq!(
            Error::NotFound("Payment record").to_string(),
            "Payment record not found"
        );
    }
}
