//! Error types for notevault
//!
//! The service raises a specific [`Error`] kind and lets the HTTP boundary
//! map kind to status code via [`IntoResponse`]. Store or cache failures are
//! surfaced as `Internal` (500-class) and are never downgraded to
//! `Unauthenticated`.

use std::io;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Result type alias for notevault
pub type Result<T> = std::result::Result<T, Error>;

/// Notevault errors
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing credentials, invalid/expired/revoked token
    #[error("{0}")]
    Unauthenticated(String),

    /// Duplicate unique key (email already registered)
    #[error("{0}")]
    Conflict(String),

    /// Referenced user or note does not exist
    #[error("{0}")]
    NotFound(String),

    /// Well-formed but semantically invalid request (e.g. self-share)
    #[error("{0}")]
    NotAcceptable(String),

    /// Malformed input shape, rejected before reaching the core
    #[error("{0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable kind, carried in every error response body.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::NotAcceptable(_) => "not_acceptable",
            Self::Validation(_) => "validation",
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Internal(_) => "internal",
        }
    }

    /// HTTP status this error maps to at the request boundary.
    ///
    /// `Conflict` maps to 406, not 409 — the duplicate-email case is treated
    /// as "not acceptable" in this API's convention.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) | Self::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Shorthand for the uniform bad-credentials error.
    ///
    /// Missing user and wrong password share this message so responses do
    /// not leak which emails exist.
    #[must_use]
    pub fn bad_credentials() -> Self {
        Self::Unauthenticated("Incorrect email or password".to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal failures keep their detail in the log, not on the wire.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Internal error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": self.kind(),
            "message": message,
        }));

        if matches!(self, Self::Unauthenticated(_)) {
            (status, [("WWW-Authenticate", "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
