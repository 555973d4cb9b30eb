//! Workspace (tenant) model and membership lookups.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Workspace record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    pub created: DateTime<Utc>,
}

impl Workspace {
    /// Create a new workspace.
    pub async fn create(pool: &PgPool, name: &str) -> Result<Self> {
        let id = Uuid::now_v7();

        let workspace = sqlx::query_as::<_, Workspace>(
            "INSERT INTO workspace (id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(id)
        .bind(name)
        .fetch_one(pool)
        .await
        .context("failed to create workspace")?;

        Ok(workspace)
    }

    /// Find a workspace by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let workspace = sqlx::query_as::<_, Workspace>("SELECT * FROM workspace WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch workspace by id")?;

        Ok(workspace)
    }

    /// Add a user to this workspace. Idempotent.
    pub async fn add_member(pool: &PgPool, workspace_id: Uuid, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO workspace_member (workspace_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (workspace_id, user_id) DO NOTHING
            "#,
        )
        .bind(workspace_id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("failed to add workspace member")?;

        Ok(())
    }

    /// Remove a user from this workspace.
    pub async fn remove_member(pool: &PgPool, workspace_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM workspace_member WHERE workspace_id = $1 AND user_id = $2",
        )
        .bind(workspace_id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("failed to remove workspace member")?;

        Ok(result.rows_affected() > 0)
    }

    /// List the workspace ids a user belongs to.
    pub async fn member_workspaces(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT workspace_id FROM workspace_member WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(pool)
                .await
                .context("failed to list user workspaces")?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}
