//! HTTP handlers for user profile endpoints.

use axum::{Extension, Json, extract::State};

use crate::Result;
use crate::auth::Session;
use crate::server::AppState;
use crate::store::PublicUser;

/// `GET /api/users` — the authenticated caller's own profile.
pub async fn profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<PublicUser>> {
    let user = state.users.profile(&session.uid).await?;
    Ok(Json(user))
}

/// `GET /api/users/getUsers` — every active user's public view.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>> {
    let users = state.users.list().await?;
    Ok(Json(users))
}
