//! The save pipeline: the single externally-callable surface composing
//! schema validation, the authorization gate, the mutation engine, and
//! cache invalidation.
//!
//! Step order is strict for every entry point: authenticate → validate →
//! load + authorize → mutate atomically → invalidate cached views. A caller
//! can therefore always distinguish "your data was malformed" from "you
//! lack permission" from "a write conflict occurred".

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::cache::CacheLayer;
use crate::editor::authz::{self, MembershipService, TemplateAction};
use crate::editor::mutation;
use crate::error::{EditorError, EditorResult};
use crate::models::template::{CreateTemplate, Template, TemplateScope, TemplateWithBlocks};
use crate::models::{Block, User, Workspace};
use crate::render::{self, RenderMode};
use crate::schema::BlockSchemaRegistry;

/// TTL for cached rendered previews (5 minutes).
const PREVIEW_TTL_SECS: u64 = 300;

/// Editor service holding the pool, cache, schema registry, and membership
/// lookups. Cheap to clone.
#[derive(Clone)]
pub struct EditorService {
    inner: Arc<EditorServiceInner>,
}

struct EditorServiceInner {
    pool: PgPool,
    cache: CacheLayer,
    registry: BlockSchemaRegistry,
    memberships: MembershipService,
}

impl EditorService {
    /// Create the editor service with the standard block types registered.
    pub fn new(pool: PgPool, cache: CacheLayer) -> Self {
        let memberships = MembershipService::new(pool.clone());
        Self {
            inner: Arc::new(EditorServiceInner {
                pool,
                cache,
                registry: BlockSchemaRegistry::with_standard_types(),
                memberships,
            }),
        }
    }

    pub fn db(&self) -> &PgPool {
        &self.inner.pool
    }

    pub fn registry(&self) -> &BlockSchemaRegistry {
        &self.inner.registry
    }

    pub fn memberships(&self) -> &MembershipService {
        &self.inner.memberships
    }

    /// Replace a block's content document.
    ///
    /// Validation runs before authorization, and neither touches storage on
    /// failure. Resubmitting identical content overwrites with no additional
    /// side effects.
    pub async fn save_block_content(
        &self,
        user: Option<&User>,
        block_id: Uuid,
        content: &Value,
    ) -> EditorResult<Block> {
        if user.is_none() {
            return Err(EditorError::Unauthenticated);
        }

        // Read-only lookup to learn the block's type; nothing is written
        // until the mutation step.
        let block = Block::find_by_id(self.db(), block_id)
            .await?
            .ok_or(EditorError::NotFound)?;

        let normalized = self
            .inner
            .registry
            .validate_and_normalize(&block.block_type, content)
            .map_err(EditorError::Validation)?;

        let template = Template::find_by_id(self.db(), block.template_id)
            .await?
            .ok_or(EditorError::NotFound)?;
        self.authorize(user, &template, TemplateAction::Edit).await?;

        let saved = Block::save_content(self.db(), block_id, &normalized)
            .await?
            .ok_or(EditorError::NotFound)?;

        self.invalidate_template_views(template.id).await;

        Ok(saved)
    }

    /// Move a block within its template and renumber the list.
    pub async fn reorder_blocks(
        &self,
        user: Option<&User>,
        template_id: Uuid,
        moved_block_id: Uuid,
        target_index: usize,
    ) -> EditorResult<Vec<Uuid>> {
        let template = self.load_authorized(user, template_id, TemplateAction::Edit).await?;

        let new_order =
            mutation::reorder_blocks(self.db(), template.id, moved_block_id, target_index).await?;

        self.invalidate_template_views(template.id).await;

        Ok(new_order)
    }

    /// Append a block with validated default content for its type.
    pub async fn create_block(
        &self,
        user: Option<&User>,
        template_id: Uuid,
        block_type: &str,
    ) -> EditorResult<Block> {
        let template = self.load_authorized(user, template_id, TemplateAction::Edit).await?;

        let block =
            mutation::create_block(self.db(), &self.inner.registry, template.id, block_type)
                .await?;

        self.invalidate_template_views(template.id).await;

        Ok(block)
    }

    /// Remove a block and compact the ordering.
    pub async fn delete_block(
        &self,
        user: Option<&User>,
        template_id: Uuid,
        block_id: Uuid,
    ) -> EditorResult<()> {
        let template = self.load_authorized(user, template_id, TemplateAction::Edit).await?;

        mutation::delete_block(self.db(), template.id, block_id).await?;

        self.invalidate_template_views(template.id).await;

        Ok(())
    }

    /// Flip a block's visibility.
    pub async fn toggle_block(
        &self,
        user: Option<&User>,
        template_id: Uuid,
        block_id: Uuid,
        is_active: bool,
    ) -> EditorResult<Block> {
        let template = self.load_authorized(user, template_id, TemplateAction::Edit).await?;

        let block = mutation::toggle_active(self.db(), template.id, block_id, is_active).await?;

        self.invalidate_template_views(template.id).await;

        Ok(block)
    }

    /// Create a template (with its initial block for `content_block` kind)
    /// in a single transaction.
    pub async fn create_template(
        &self,
        user: Option<&User>,
        input: CreateTemplate,
    ) -> EditorResult<Template> {
        let scope = match input.workspace_id {
            Some(id) => TemplateScope::Workspace(id),
            None => TemplateScope::Global,
        };
        self.authorize_scope(user, scope, TemplateAction::Edit).await?;

        // authorize_scope already rejected the anonymous caller
        let Some(user) = user else {
            return Err(EditorError::Unauthenticated);
        };

        let template =
            mutation::create_template(self.db(), &self.inner.registry, user.id, input).await?;

        self.inner.cache.invalidate_tag(CacheLayer::LISTING_TAG).await;

        Ok(template)
    }

    /// Delete a template and everything in it.
    pub async fn delete_template(&self, user: Option<&User>, template_id: Uuid) -> EditorResult<()> {
        let template = self.load_authorized(user, template_id, TemplateAction::Delete).await?;

        if !Template::delete(self.db(), template.id).await? {
            return Err(EditorError::NotFound);
        }

        self.invalidate_template_views(template.id).await;

        Ok(())
    }

    /// The template with its ordered blocks, for the editing canvas.
    pub async fn get_template_for_edit(
        &self,
        user: Option<&User>,
        template_id: Uuid,
    ) -> EditorResult<TemplateWithBlocks> {
        let template = self.load_authorized(user, template_id, TemplateAction::Edit).await?;

        Template::find_with_blocks(self.db(), template.id)
            .await?
            .ok_or(EditorError::NotFound)
    }

    /// List templates, optionally filtered to one scope.
    ///
    /// Listing a workspace's templates requires membership. Unfiltered
    /// listings show global templates plus the caller's own workspaces,
    /// never another tenant's.
    pub async fn list_templates(
        &self,
        user: Option<&User>,
        scope: Option<TemplateScope>,
    ) -> EditorResult<Vec<Template>> {
        let Some(user) = user else {
            return Err(EditorError::Unauthenticated);
        };

        let memberships = self.inner.memberships.memberships(user.id).await?;

        if let Some(TemplateScope::Workspace(workspace_id)) = scope
            && !memberships.contains(&workspace_id)
        {
            return Err(EditorError::Forbidden(
                "not a member of this workspace".to_string(),
            ));
        }

        let mut templates = Template::list(self.db(), scope).await?;
        templates.retain(|template| authz::is_listed_for(template.scope(), &memberships));

        Ok(templates)
    }

    /// Create a workspace. Platform-level operation.
    pub async fn create_workspace(
        &self,
        user: Option<&User>,
        name: &str,
    ) -> EditorResult<Workspace> {
        authz::check_platform_admin(user)?;

        Ok(Workspace::create(self.db(), name).await?)
    }

    /// Add a user to a workspace and drop their cached membership set.
    pub async fn add_workspace_member(
        &self,
        user: Option<&User>,
        workspace_id: Uuid,
        member_id: Uuid,
    ) -> EditorResult<()> {
        authz::check_platform_admin(user)?;

        if Workspace::find_by_id(self.db(), workspace_id).await?.is_none() {
            return Err(EditorError::NotFound);
        }
        if User::find_by_id(self.db(), member_id).await?.is_none() {
            return Err(EditorError::NotFound);
        }

        Workspace::add_member(self.db(), workspace_id, member_id).await?;
        self.inner.memberships.invalidate_user(member_id);

        Ok(())
    }

    /// Remove a user from a workspace and drop their cached membership set.
    pub async fn remove_workspace_member(
        &self,
        user: Option<&User>,
        workspace_id: Uuid,
        member_id: Uuid,
    ) -> EditorResult<()> {
        authz::check_platform_admin(user)?;

        if !Workspace::remove_member(self.db(), workspace_id, member_id).await? {
            return Err(EditorError::NotFound);
        }
        self.inner.memberships.invalidate_user(member_id);

        Ok(())
    }

    /// Rendered HTML for the public preview: active blocks only, cached,
    /// no authorization (the preview path is public).
    pub async fn render_preview(&self, template_id: Uuid) -> EditorResult<String> {
        let key = CacheLayer::preview_key(template_id);
        if let Some(cached) = self.inner.cache.get(&key).await {
            return Ok(cached);
        }

        let with_blocks = Template::find_with_blocks(self.db(), template_id)
            .await?
            .ok_or(EditorError::NotFound)?;

        let html = render::render_blocks(&with_blocks.blocks, RenderMode::Preview);

        let tag = CacheLayer::template_tag(template_id);
        self.inner
            .cache
            .set(&key, &html, PREVIEW_TTL_SECS, &[&tag])
            .await;

        Ok(html)
    }

    /// Rendered HTML for the editing canvas: inactive blocks included but
    /// dimmed, authorization required, never cached.
    pub async fn render_canvas(
        &self,
        user: Option<&User>,
        template_id: Uuid,
    ) -> EditorResult<String> {
        let template = self.load_authorized(user, template_id, TemplateAction::Edit).await?;

        let blocks = Block::list_for_template(self.db(), template.id).await?;

        Ok(render::render_blocks(&blocks, RenderMode::Canvas))
    }

    /// Load a template and run the authorization gate against it.
    async fn load_authorized(
        &self,
        user: Option<&User>,
        template_id: Uuid,
        action: TemplateAction,
    ) -> EditorResult<Template> {
        if user.is_none() {
            return Err(EditorError::Unauthenticated);
        }

        let template = Template::find_by_id(self.db(), template_id)
            .await?
            .ok_or(EditorError::NotFound)?;

        self.authorize(user, &template, action).await?;

        Ok(template)
    }

    async fn authorize(
        &self,
        user: Option<&User>,
        template: &Template,
        action: TemplateAction,
    ) -> EditorResult<()> {
        self.authorize_scope(user, template.scope(), action).await
    }

    async fn authorize_scope(
        &self,
        user: Option<&User>,
        scope: TemplateScope,
        action: TemplateAction,
    ) -> EditorResult<()> {
        let memberships = match (user, scope) {
            (Some(user), TemplateScope::Workspace(_)) => {
                self.inner.memberships.memberships(user.id).await?
            }
            _ => HashSet::new(),
        };

        authz::check_scope_access(user, &memberships, scope, action)
    }

    /// Signal that cached views of a template (and the listing pages) are
    /// stale. Fire-and-forget: cache failures are logged, never surfaced.
    async fn invalidate_template_views(&self, template_id: Uuid) {
        let tag = CacheLayer::template_tag(template_id);
        self.inner.cache.invalidate_tag(&tag).await;
        self.inner.cache.invalidate_tag(CacheLayer::LISTING_TAG).await;
        debug!(template_id = %template_id, "template views invalidated");
    }
}

impl std::fmt::Debug for EditorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorService").finish()
    }
}
