//! Block model — one ordered, typed content unit inside a template.
//!
//! All ordering mutations go through [`crate::editor::mutation`]; this module
//! only exposes reads and single-row writes that cannot break the contiguous
//! `sort_order` invariant on their own.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Block record.
///
/// `content` is a JSON document whose shape is determined by `block_type`
/// (see [`crate::schema::BlockSchemaRegistry`]). Serialized with the wire
/// field names the editor front-end uses.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: Uuid,
    pub template_id: Uuid,
    #[serde(rename = "type")]
    pub block_type: String,
    pub content: serde_json::Value,
    pub sort_order: i32,
    pub is_active: bool,
    pub created: DateTime<Utc>,
    pub changed: DateTime<Utc>,
}

impl Block {
    /// Find a block by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let block = sqlx::query_as::<_, Block>("SELECT * FROM block WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch block by id")?;

        Ok(block)
    }

    /// List a template's blocks in sort order.
    pub async fn list_for_template(pool: &PgPool, template_id: Uuid) -> Result<Vec<Self>> {
        let blocks = sqlx::query_as::<_, Block>(
            "SELECT * FROM block WHERE template_id = $1 ORDER BY sort_order ASC",
        )
        .bind(template_id)
        .fetch_all(pool)
        .await
        .context("failed to list blocks for template")?;

        Ok(blocks)
    }

    /// Replace a block's content document.
    ///
    /// The caller must have validated `content` against the block's type
    /// schema; this is a plain overwrite with no additive side effects.
    pub async fn save_content(
        pool: &PgPool,
        id: Uuid,
        content: &serde_json::Value,
    ) -> Result<Option<Self>> {
        let block = sqlx::query_as::<_, Block>(
            "UPDATE block SET content = $1, changed = now() WHERE id = $2 RETURNING *",
        )
        .bind(content)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to save block content")?;

        Ok(block)
    }
}
