//! HTTP handlers for the authentication endpoints.

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use super::{AuthResponse, Session};
use crate::server::AppState;
use crate::store::Gender;
use crate::{Error, Result};

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    /// Display name, at least two characters
    pub name: String,
    /// Unique email address
    pub email: String,
    /// Plaintext password, validated before hashing
    pub password: String,
    /// Optional gender, defaults to unspecified
    #[serde(default)]
    pub gender: Gender,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Registered email address
    pub email: String,
    /// Plaintext password
    pub password: String,
}

/// Refresh-exchange request body.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// The long-lived refresh token from login/signup
    pub refresh_token: String,
}

fn validate_signup(req: &SignUpRequest) -> Result<()> {
    if req.name.trim().chars().count() < 2 {
        return Err(Error::Validation(
            "Name must be at least 2 characters".to_string(),
        ));
    }
    validate_email(&req.email)?;
    validate_password(&req.password)
}

fn validate_email(email: &str) -> Result<()> {
    let ok = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    });
    if ok {
        Ok(())
    } else {
        Err(Error::Validation("Invalid email address".to_string()))
    }
}

/// Passwords need length and a basic character mix; specials are allowed
/// but not required.
fn validate_password(password: &str) -> Result<()> {
    let long_enough = password.chars().count() >= 6;
    let has_upper = password.chars().any(char::is_uppercase);
    let has_lower = password.chars().any(char::is_lowercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_upper && has_lower && has_digit {
        Ok(())
    } else {
        Err(Error::Validation(
            "Password must be at least 6 characters with upper case, lower case and a digit"
                .to_string(),
        ))
    }
}

/// `POST /api/auth/signup` — register and receive a first session.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<Json<AuthResponse>> {
    validate_signup(&req)?;
    let response = state
        .authority
        .sign_up(req.name, req.email, req.gender, &req.password)
        .await?;
    Ok(Json(response))
}

/// `POST /api/auth/login` — authenticate and receive a fresh session.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let response = state.authority.login(&req.email, &req.password).await?;
    Ok(Json(response))
}

/// `POST /api/auth/refresh` — exchange a refresh token for a new session.
///
/// 401 unless the refresh variant is enabled and the token's session has
/// not been logged out.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>> {
    let response = state.authority.refresh(&req.refresh_token).await?;
    Ok(Json(response))
}

/// `POST /api/auth/logout` — revoke the presented session.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> impl IntoResponse {
    state.authority.logout(&session).await;
    (
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Logged out successfully" })),
    )
}
