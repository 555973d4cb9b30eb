//! Template editor JSON API.
//!
//! Thin HTTP shell over [`EditorService`]: handlers deserialize the request,
//! resolve the session user, and delegate. Every mutating endpoint returns
//! the uniform `{ "success": ... }` envelope; failures go through
//! [`EditorError`]'s response mapping.

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{EditorError, EditorResult};
use crate::models::template::{CreateTemplate, TemplateKind, TemplateScope};
use crate::routes::helpers::current_user;
use crate::schema::FieldErrors;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ListQuery {
    /// `global` or a workspace id; omitted lists everything.
    workspace: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTemplateRequest {
    name: String,
    description: Option<String>,
    #[serde(default = "default_kind")]
    kind: TemplateKind,
    workspace_id: Option<Uuid>,
}

fn default_kind() -> TemplateKind {
    TemplateKind::ProfileTemplate
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveContentRequest {
    content: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderRequest {
    moved_block_id: Uuid,
    target_index: usize,
}

#[derive(Debug, Deserialize)]
struct CreateBlockRequest {
    #[serde(rename = "type")]
    block_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleRequest {
    is_active: bool,
}

/// GET /api/templates — list templates, optionally filtered by scope.
async fn list_templates(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> EditorResult<Json<Value>> {
    let user = current_user(&state, &session).await;

    let scope = match query.workspace.as_deref() {
        None => None,
        Some("global") => Some(TemplateScope::Global),
        Some(raw) => {
            let id = Uuid::parse_str(raw).map_err(|_| {
                let mut errors = FieldErrors::new();
                errors.push("workspace", "must be 'global' or a workspace id");
                EditorError::Validation(errors)
            })?;
            Some(TemplateScope::Workspace(id))
        }
    };

    let templates = state.editor().list_templates(user.as_ref(), scope).await?;

    Ok(Json(json!({ "success": true, "templates": templates })))
}

/// POST /api/templates — create a template.
async fn create_template(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CreateTemplateRequest>,
) -> EditorResult<Json<Value>> {
    if body.name.trim().is_empty() {
        let mut errors = FieldErrors::new();
        errors.push("name", "must not be empty");
        return Err(EditorError::Validation(errors));
    }

    let user = current_user(&state, &session).await;

    let template = state
        .editor()
        .create_template(
            user.as_ref(),
            CreateTemplate {
                name: body.name.trim().to_string(),
                description: body.description,
                kind: body.kind,
                workspace_id: body.workspace_id,
            },
        )
        .await?;

    Ok(Json(json!({ "success": true, "template": template })))
}

/// GET /api/templates/{id} — template with its ordered blocks.
async fn get_template(
    State(state): State<AppState>,
    session: Session,
    Path(template_id): Path<Uuid>,
) -> EditorResult<Json<Value>> {
    let user = current_user(&state, &session).await;

    let with_blocks = state
        .editor()
        .get_template_for_edit(user.as_ref(), template_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "template": with_blocks.template,
        "blocks": with_blocks.blocks,
    })))
}

/// DELETE /api/templates/{id}
async fn delete_template(
    State(state): State<AppState>,
    session: Session,
    Path(template_id): Path<Uuid>,
) -> EditorResult<Json<Value>> {
    let user = current_user(&state, &session).await;

    state
        .editor()
        .delete_template(user.as_ref(), template_id)
        .await?;

    Ok(Json(json!({ "success": true })))
}

/// POST /api/blocks/{id}/content — replace a block's content document.
async fn save_block_content(
    State(state): State<AppState>,
    session: Session,
    Path(block_id): Path<Uuid>,
    Json(body): Json<SaveContentRequest>,
) -> EditorResult<Json<Value>> {
    let user = current_user(&state, &session).await;

    let block = state
        .editor()
        .save_block_content(user.as_ref(), block_id, &body.content)
        .await?;

    Ok(Json(json!({ "success": true, "block": block })))
}

/// POST /api/templates/{id}/reorder — move a block within its template.
async fn reorder_blocks(
    State(state): State<AppState>,
    session: Session,
    Path(template_id): Path<Uuid>,
    Json(body): Json<ReorderRequest>,
) -> EditorResult<Json<Value>> {
    let user = current_user(&state, &session).await;

    let new_order = state
        .editor()
        .reorder_blocks(
            user.as_ref(),
            template_id,
            body.moved_block_id,
            body.target_index,
        )
        .await?;

    Ok(Json(json!({ "success": true, "newOrder": new_order })))
}

/// POST /api/templates/{id}/blocks — append a block of the given type.
async fn create_block(
    State(state): State<AppState>,
    session: Session,
    Path(template_id): Path<Uuid>,
    Json(body): Json<CreateBlockRequest>,
) -> EditorResult<Json<Value>> {
    let user = current_user(&state, &session).await;

    let block = state
        .editor()
        .create_block(user.as_ref(), template_id, &body.block_type)
        .await?;

    Ok(Json(json!({ "success": true, "blockId": block.id, "block": block })))
}

/// DELETE /api/templates/{id}/blocks/{block_id}
async fn delete_block(
    State(state): State<AppState>,
    session: Session,
    Path((template_id, block_id)): Path<(Uuid, Uuid)>,
) -> EditorResult<Json<Value>> {
    let user = current_user(&state, &session).await;

    state
        .editor()
        .delete_block(user.as_ref(), template_id, block_id)
        .await?;

    Ok(Json(json!({ "success": true })))
}

/// POST /api/templates/{id}/blocks/{block_id}/active — flip visibility.
async fn toggle_block(
    State(state): State<AppState>,
    session: Session,
    Path((template_id, block_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<ToggleRequest>,
) -> EditorResult<Json<Value>> {
    let user = current_user(&state, &session).await;

    let block = state
        .editor()
        .toggle_block(user.as_ref(), template_id, block_id, body.is_active)
        .await?;

    Ok(Json(json!({ "success": true, "block": block })))
}

/// Create the editor API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/templates", get(list_templates).post(create_template))
        .route(
            "/api/templates/{id}",
            get(get_template).delete(delete_template),
        )
        .route("/api/blocks/{id}/content", post(save_block_content))
        .route("/api/templates/{id}/reorder", post(reorder_blocks))
        .route("/api/templates/{id}/blocks", post(create_block))
        .route(
            "/api/templates/{id}/blocks/{block_id}",
            delete(delete_block),
        )
        .route(
            "/api/templates/{id}/blocks/{block_id}/active",
            post(toggle_block),
        )
}
