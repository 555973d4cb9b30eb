//! Workspace provisioning and membership management API.
//!
//! Platform administrators only. Membership changes invalidate the member's
//! cached workspace set, so authorization decisions pick up the change
//! immediately.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{EditorError, EditorResult};
use crate::routes::helpers::current_user;
use crate::schema::FieldErrors;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct CreateWorkspaceRequest {
    name: String,
}

/// POST /api/workspaces — create a workspace.
async fn create_workspace(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CreateWorkspaceRequest>,
) -> EditorResult<Json<Value>> {
    if body.name.trim().is_empty() {
        let mut errors = FieldErrors::new();
        errors.push("name", "must not be empty");
        return Err(EditorError::Validation(errors));
    }

    let user = current_user(&state, &session).await;

    let workspace = state
        .editor()
        .create_workspace(user.as_ref(), body.name.trim())
        .await?;

    Ok(Json(json!({ "success": true, "workspace": workspace })))
}

/// POST /api/workspaces/{id}/members/{user_id} — add a member.
async fn add_member(
    State(state): State<AppState>,
    session: Session,
    Path((workspace_id, member_id)): Path<(Uuid, Uuid)>,
) -> EditorResult<Json<Value>> {
    let user = current_user(&state, &session).await;

    state
        .editor()
        .add_workspace_member(user.as_ref(), workspace_id, member_id)
        .await?;

    Ok(Json(json!({ "success": true })))
}

/// DELETE /api/workspaces/{id}/members/{user_id} — remove a member.
async fn remove_member(
    State(state): State<AppState>,
    session: Session,
    Path((workspace_id, member_id)): Path<(Uuid, Uuid)>,
) -> EditorResult<Json<Value>> {
    let user = current_user(&state, &session).await;

    state
        .editor()
        .remove_workspace_member(user.as_ref(), workspace_id, member_id)
        .await?;

    Ok(Json(json!({ "success": true })))
}

/// Create the workspace admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/workspaces", post(create_workspace))
        .route(
            "/api/workspaces/{id}/members/{user_id}",
            post(add_member).delete(remove_member),
        )
}
