//! Unified error handling with Sentry integration.
//!
//! Handlers return [`Result<T>`]; server-side failures are captured to
//! Sentry before the response is written, client errors are not.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use punchout_bridge_core::CartError;
use thiserror::Error;

use crate::cxml::CxmlError;
use crate::services::session_token::TokenError;

#[derive(Debug, Error)]
pub enum AppError {
    /// The inbound cXML could not be read.
    #[error("{0}")]
    Cxml(#[from] CxmlError),

    /// The returned cart failed validation.
    #[error("Invalid cart: {0}")]
    Cart(#[from] CartError),

    /// A session token could not be issued.
    #[error("Session token error: {0}")]
    Token(#[from] TokenError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Cxml(_) | Self::Cart(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::warn!(error = %self, "Rejected request");
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, message).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
