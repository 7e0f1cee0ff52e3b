//! HTTP handlers for the note endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use super::{DeleteOutcome, ShareOutcome};
use crate::Result;
use crate::auth::Session;
use crate::server::AppState;
use crate::store::Note;

/// Create/update request body.
#[derive(Debug, Deserialize)]
pub struct NoteBody {
    /// The note text
    pub note: String,
}

/// Query parameters for the list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Optional substring filter on the note body
    pub search_key: Option<String>,
}

/// Share request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareBody {
    /// `uid` of the recipient user
    pub to_user_uid: String,
}

/// `POST /api/notes` — create a note, 201 on success.
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(body): Json<NoteBody>,
) -> Result<(StatusCode, Json<Note>)> {
    let note = state.notes.create(&session.uid, body.note).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// `GET /api/notes` — the caller's notes, optionally filtered by `searchKey`.
pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Note>>> {
    let notes = state
        .notes
        .find_all(&session.uid, params.search_key.as_deref())
        .await?;
    Ok(Json(notes))
}

/// `GET /api/notes/{uid}` — a single note, reported as 302 FOUND.
pub async fn find_one(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse> {
    let note = state.notes.find_one(&uid).await?;
    Ok((StatusCode::FOUND, Json(note)))
}

/// `PUT /api/notes/{uid}` — replace the note body.
pub async fn update(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(body): Json<NoteBody>,
) -> Result<Json<Note>> {
    let note = state.notes.update(&uid, body.note).await?;
    Ok(Json(note))
}

/// `DELETE /api/notes/{uid}` — soft-delete, reporting affected rows.
pub async fn remove(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<DeleteOutcome>> {
    let outcome = state.notes.remove(&uid).await?;
    Ok(Json(outcome))
}

/// `POST /api/notes/{uid}/share` — share the note with another user.
pub async fn share(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(uid): Path<String>,
    Json(body): Json<ShareBody>,
) -> Result<Json<ShareOutcome>> {
    let outcome = state
        .notes
        .share(&session.uid, &uid, &body.to_user_uid)
        .await?;
    Ok(Json(outcome))
}
