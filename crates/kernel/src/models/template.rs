//! Template model — a named, ownership-scoped container for blocks.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Block;

/// What a template is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    ProfileTemplate,
    ContentBlock,
}

impl TemplateKind {
    /// Parse a kind from its stored text form. Unknown values degrade to
    /// `profile_template`.
    pub fn parse(value: &str) -> Self {
        match value {
            "content_block" => TemplateKind::ContentBlock,
            _ => TemplateKind::ProfileTemplate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::ProfileTemplate => "profile_template",
            TemplateKind::ContentBlock => "content_block",
        }
    }
}

/// Ownership scope of a template: the platform globally, or one workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateScope {
    Global,
    Workspace(Uuid),
}

/// Template record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub workspace_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created: DateTime<Utc>,
    pub changed: DateTime<Utc>,
}

/// Input for creating a template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplate {
    pub name: String,
    pub description: Option<String>,
    pub kind: TemplateKind,
    /// None creates a platform-global template.
    pub workspace_id: Option<Uuid>,
}

/// A template together with its ordered blocks, as served to the editor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateWithBlocks {
    pub template: Template,
    pub blocks: Vec<Block>,
}

impl Template {
    /// Parsed kind.
    pub fn kind(&self) -> TemplateKind {
        TemplateKind::parse(&self.kind)
    }

    /// Ownership scope derived from the workspace column.
    pub fn scope(&self) -> TemplateScope {
        match self.workspace_id {
            Some(id) => TemplateScope::Workspace(id),
            None => TemplateScope::Global,
        }
    }

    /// Find a template by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let template = sqlx::query_as::<_, Template>("SELECT * FROM template WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch template by id")?;

        Ok(template)
    }

    /// List templates, optionally filtered to one scope.
    pub async fn list(pool: &PgPool, scope: Option<TemplateScope>) -> Result<Vec<Self>> {
        let templates = match scope {
            None => {
                sqlx::query_as::<_, Template>("SELECT * FROM template ORDER BY name ASC")
                    .fetch_all(pool)
                    .await
            }
            Some(TemplateScope::Global) => {
                sqlx::query_as::<_, Template>(
                    "SELECT * FROM template WHERE workspace_id IS NULL ORDER BY name ASC",
                )
                .fetch_all(pool)
                .await
            }
            Some(TemplateScope::Workspace(id)) => {
                sqlx::query_as::<_, Template>(
                    "SELECT * FROM template WHERE workspace_id = $1 ORDER BY name ASC",
                )
                .bind(id)
                .fetch_all(pool)
                .await
            }
        }
        .context("failed to list templates")?;

        Ok(templates)
    }

    /// Load a template together with its blocks in sort order.
    pub async fn find_with_blocks(pool: &PgPool, id: Uuid) -> Result<Option<TemplateWithBlocks>> {
        let Some(template) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let blocks = Block::list_for_template(pool, id).await?;

        Ok(Some(TemplateWithBlocks { template, blocks }))
    }

    /// Delete a template (blocks cascade).
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM template WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete template")?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn make_template(workspace_id: Option<Uuid>) -> Template {
        Template {
            id: Uuid::nil(),
            name: "Landing page".into(),
            description: None,
            kind: "profile_template".into(),
            workspace_id,
            created_by: Uuid::nil(),
            created: Utc::now(),
            changed: Utc::now(),
        }
    }

    #[test]
    fn scope_derives_from_workspace_column() {
        assert_eq!(make_template(None).scope(), TemplateScope::Global);

        let ws = Uuid::now_v7();
        assert_eq!(
            make_template(Some(ws)).scope(),
            TemplateScope::Workspace(ws)
        );
    }

    #[test]
    fn kind_parse_round_trip() {
        for kind in [TemplateKind::ProfileTemplate, TemplateKind::ContentBlock] {
            assert_eq!(TemplateKind::parse(kind.as_str()), kind);
        }
        assert_eq!(
            TemplateKind::parse("bogus"),
            TemplateKind::ProfileTemplate
        );
    }
}
