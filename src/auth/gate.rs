//! Request gate — per-request authorization middleware.
//!
//! Every inbound request is classified against an explicit public-path table
//! (no route metadata reflection): public paths pass through untouched;
//! everything else must carry `Authorization: Bearer <token>` with the
//! scheme spelled exactly `Bearer`. The token is verified (signature,
//! expiry) and checked against the revocation cache, and the decoded
//! [`Session`] is attached to the request extensions for handlers to
//! extract.
//!
//! Verification is synchronous per request with no retries; its only side
//! effect is the revocation-cache lookup.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use super::SessionAuthority;
use crate::Error;

/// State for the session gate: the authority plus the public-path table.
pub struct GateConfig {
    /// The session authority performing verification
    pub authority: Arc<SessionAuthority>,
    /// Paths that bypass authentication (exact match)
    pub public_paths: Vec<String>,
}

impl GateConfig {
    /// `true` if `path` bypasses authentication.
    #[must_use]
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
    }
}

/// Extract the bearer token from the `Authorization` header.
///
/// The scheme must be exactly `Bearer`; any other scheme (including a
/// different casing) or a missing header yields `None`.
fn extract_bearer(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Session gate middleware.
pub async fn session_gate(
    State(gate): State<Arc<GateConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();

    if gate.is_public_path(path) {
        debug!(path = %path, "Public path, skipping session check");
        return next.run(request).await;
    }

    let Some(token) = extract_bearer(&request) else {
        warn!(path = %path, "Missing or malformed Authorization header");
        return Error::Unauthenticated(
            "Missing Authorization header. Use: Authorization: Bearer <token>".to_string(),
        )
        .into_response();
    };

    match gate.authority.verify_session(token) {
        Ok(session) => {
            debug!(path = %path, uid = %session.uid, "Authenticated request");
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => {
            warn!(path = %path, "Rejected token");
            err.into_response()
        }
    }
}
