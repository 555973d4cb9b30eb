//! Transactional mutations over a template's block list.
//!
//! Every operation here is a single database transaction: it either commits
//! the whole mutation (with `sort_order` contiguous again) or leaves no
//! trace. The block list is row-locked for the duration, so a concurrent
//! reader only ever observes a fully-committed state.

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::editor::ordering;
use crate::error::{EditorError, EditorResult};
use crate::models::template::{CreateTemplate, Template, TemplateKind};
use crate::models::Block;
use crate::schema::{BlockSchemaRegistry, FieldErrors};

/// Block type used for the initial block of a `content_block` template.
const INITIAL_BLOCK_TYPE: &str = "text";

/// Move a block to `target_index` and renumber the whole list `0..N-1`.
///
/// Returns the new id order. The whole affected list is written inside one
/// transaction, never block-by-block across transactions, so no observable
/// intermediate state exists. Moving a block onto its current index is a
/// no-op that writes nothing.
pub async fn reorder_blocks(
    pool: &PgPool,
    template_id: Uuid,
    moved_block_id: Uuid,
    target_index: usize,
) -> EditorResult<Vec<Uuid>> {
    let mut tx = pool.begin().await?;

    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM block WHERE template_id = $1 ORDER BY sort_order ASC FOR UPDATE",
    )
    .bind(template_id)
    .fetch_all(&mut *tx)
    .await?;
    let ids: Vec<Uuid> = rows.into_iter().map(|r| r.0).collect();

    let Some(new_order) = ordering::reorder_ids(&ids, moved_block_id, target_index) else {
        return Err(EditorError::NotFound);
    };

    if new_order == ids {
        // No-op move; nothing to write.
        return Ok(ids);
    }

    for (index, id) in new_order.iter().enumerate() {
        sqlx::query("UPDATE block SET sort_order = $1, changed = now() WHERE id = $2")
            .bind(index as i32)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(new_order)
}

/// Create a block of `block_type` at the end of the template's list, with
/// the type's validated default content.
///
/// The template row is locked first, which serializes concurrent inserts on
/// the same template — two sequential creates on an empty template land at
/// sort orders 0 and 1, never colliding.
pub async fn create_block(
    pool: &PgPool,
    registry: &BlockSchemaRegistry,
    template_id: Uuid,
    block_type: &str,
) -> EditorResult<Block> {
    let Some(content) = registry.default_content(block_type) else {
        let mut errors = FieldErrors::new();
        errors.push("type", format!("unknown block type '{block_type}'"));
        return Err(EditorError::Validation(errors));
    };

    let mut tx = pool.begin().await?;

    let template: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM template WHERE id = $1 FOR UPDATE")
            .bind(template_id)
            .fetch_optional(&mut *tx)
            .await?;
    if template.is_none() {
        return Err(EditorError::NotFound);
    }

    let rows: Vec<(i32,)> =
        sqlx::query_as("SELECT sort_order FROM block WHERE template_id = $1")
            .bind(template_id)
            .fetch_all(&mut *tx)
            .await?;
    let orders: Vec<i32> = rows.into_iter().map(|r| r.0).collect();

    let block = insert_block(
        &mut tx,
        template_id,
        block_type,
        &content,
        ordering::next_append_order(&orders),
    )
    .await?;

    tx.commit().await?;

    Ok(block)
}

/// Remove a block and compact the sort orders above it by one.
///
/// A `block_id` that does not belong to `template_id` is NotFound and
/// mutates nothing, whether the block exists elsewhere or not.
pub async fn delete_block(pool: &PgPool, template_id: Uuid, block_id: Uuid) -> EditorResult<()> {
    let mut tx = pool.begin().await?;

    let rows: Vec<(Uuid, i32)> = sqlx::query_as(
        "SELECT id, sort_order FROM block WHERE template_id = $1 ORDER BY sort_order ASC FOR UPDATE",
    )
    .bind(template_id)
    .fetch_all(&mut *tx)
    .await?;
    let ids: Vec<Uuid> = rows.iter().map(|r| r.0).collect();

    let Some(remaining) = ordering::remove_id(&ids, block_id) else {
        return Err(EditorError::NotFound);
    };

    sqlx::query("DELETE FROM block WHERE id = $1")
        .bind(block_id)
        .execute(&mut *tx)
        .await?;

    // Renumber only the blocks whose position changed.
    for (index, id) in remaining.iter().enumerate() {
        let current = rows.iter().find(|r| r.0 == *id).map(|r| r.1);
        if current != Some(index as i32) {
            sqlx::query("UPDATE block SET sort_order = $1, changed = now() WHERE id = $2")
                .bind(index as i32)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;

    Ok(())
}

/// Flip a block's visibility without altering order.
pub async fn toggle_active(
    pool: &PgPool,
    template_id: Uuid,
    block_id: Uuid,
    is_active: bool,
) -> EditorResult<Block> {
    let block = sqlx::query_as::<_, Block>(
        r#"
        UPDATE block
        SET is_active = $1, changed = now()
        WHERE id = $2 AND template_id = $3
        RETURNING *
        "#,
    )
    .bind(is_active)
    .bind(block_id)
    .bind(template_id)
    .fetch_optional(pool)
    .await?;

    block.ok_or(EditorError::NotFound)
}

/// Create a template; a `content_block` template is created together with
/// exactly one initial block at sort position 0, in the same transaction —
/// never partially created.
pub async fn create_template(
    pool: &PgPool,
    registry: &BlockSchemaRegistry,
    created_by: Uuid,
    input: CreateTemplate,
) -> EditorResult<Template> {
    let mut tx = pool.begin().await?;

    let id = Uuid::now_v7();
    let template = sqlx::query_as::<_, Template>(
        r#"
        INSERT INTO template (id, name, description, kind, workspace_id, created_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.kind.as_str())
    .bind(input.workspace_id)
    .bind(created_by)
    .fetch_one(&mut *tx)
    .await?;

    if input.kind == TemplateKind::ContentBlock {
        let content = registry
            .default_content(INITIAL_BLOCK_TYPE)
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        insert_block(&mut tx, id, INITIAL_BLOCK_TYPE, &content, 0).await?;
    }

    tx.commit().await?;

    Ok(template)
}

async fn insert_block(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    template_id: Uuid,
    block_type: &str,
    content: &Value,
    sort_order: i32,
) -> EditorResult<Block> {
    let block = sqlx::query_as::<_, Block>(
        r#"
        INSERT INTO block (id, template_id, block_type, content, sort_order)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(template_id)
    .bind(block_type)
    .bind(content)
    .bind(sort_order)
    .fetch_one(&mut **tx)
    .await?;

    Ok(block)
}
