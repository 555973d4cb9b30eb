//! Authorization gate for template mutations.
//!
//! The decision itself is a pure function over the acting user, their
//! workspace memberships, and the template's ownership scope; the
//! [`MembershipService`] supplies memberships with a DashMap cache in front
//! of the database.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{EditorError, EditorResult};
use crate::models::{Template, TemplateScope, User, Workspace};

/// What the caller is trying to do to a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateAction {
    Edit,
    Delete,
}

/// Decide whether `user` may perform `action` on a template with the given
/// ownership scope.
///
/// - Global templates: platform administrators only (both admin tiers).
/// - Workspace templates: recorded members of that workspace only.
///   Platform admins do NOT get automatic access — tenant isolation is
///   deliberate and must not be "fixed" into an admin override.
/// - Deleting a global template requires platform admin regardless of any
///   workspace context (subsumed by the global rule, kept explicit).
pub fn check_scope_access(
    user: Option<&User>,
    memberships: &HashSet<Uuid>,
    scope: TemplateScope,
    action: TemplateAction,
) -> EditorResult<()> {
    let Some(user) = user else {
        return Err(EditorError::Unauthenticated);
    };

    match scope {
        TemplateScope::Global => {
            if user.is_platform_admin() {
                Ok(())
            } else {
                let verb = match action {
                    TemplateAction::Edit => "edit",
                    TemplateAction::Delete => "delete",
                };
                Err(EditorError::Forbidden(format!(
                    "platform administrator role required to {verb} global templates"
                )))
            }
        }
        TemplateScope::Workspace(workspace_id) => {
            if memberships.contains(&workspace_id) {
                Ok(())
            } else {
                Err(EditorError::Forbidden(
                    "not a member of the workspace that owns this template".to_string(),
                ))
            }
        }
    }
}

/// Decide whether `user` may provision workspaces or change their
/// membership. These are platform-level operations, not workspace-scoped
/// ones, so the admin tiers govern them the same way they govern global
/// templates.
pub fn check_platform_admin(user: Option<&User>) -> EditorResult<()> {
    let Some(user) = user else {
        return Err(EditorError::Unauthenticated);
    };

    if user.is_platform_admin() {
        Ok(())
    } else {
        Err(EditorError::Forbidden(
            "platform administrator role required to manage workspaces".to_string(),
        ))
    }
}

/// Whether a template with this scope appears in listings for a user with
/// the given memberships. Global templates are listable by any
/// authenticated user; workspace templates only by that workspace's
/// members.
pub fn is_listed_for(scope: TemplateScope, memberships: &HashSet<Uuid>) -> bool {
    match scope {
        TemplateScope::Global => true,
        TemplateScope::Workspace(workspace_id) => memberships.contains(&workspace_id),
    }
}

/// Convenience wrapper taking the template itself.
pub fn check_template_access(
    user: Option<&User>,
    memberships: &HashSet<Uuid>,
    template: &Template,
    action: TemplateAction,
) -> EditorResult<()> {
    check_scope_access(user, memberships, template.scope(), action)
}

/// Workspace membership lookups with a DashMap cache.
#[derive(Clone)]
pub struct MembershipService {
    inner: Arc<MembershipServiceInner>,
}

struct MembershipServiceInner {
    /// Cache of user_id -> workspace ids.
    cache: DashMap<Uuid, HashSet<Uuid>>,

    /// Database pool for cache misses.
    pool: PgPool,
}

impl MembershipService {
    /// Create a new membership service.
    pub fn new(pool: PgPool) -> Self {
        Self {
            inner: Arc::new(MembershipServiceInner {
                cache: DashMap::new(),
                pool,
            }),
        }
    }

    /// The set of workspace ids the user belongs to.
    pub async fn memberships(&self, user_id: Uuid) -> EditorResult<HashSet<Uuid>> {
        if let Some(cached) = self.inner.cache.get(&user_id) {
            return Ok(cached.clone());
        }

        let memberships: HashSet<Uuid> = Workspace::member_workspaces(&self.inner.pool, user_id)
            .await?
            .into_iter()
            .collect();

        self.inner.cache.insert(user_id, memberships.clone());

        Ok(memberships)
    }

    /// Invalidate the cache for a specific user.
    ///
    /// Call this when the user's workspace memberships change.
    pub fn invalidate_user(&self, user_id: Uuid) {
        self.inner.cache.remove(&user_id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: &str) -> User {
        User {
            id: Uuid::now_v7(),
            name: "test".into(),
            mail: "test@example.com".into(),
            role: role.into(),
            status: 1,
            created: Utc::now(),
        }
    }

    fn global_template() -> Template {
        template_scoped(None)
    }

    fn template_scoped(workspace_id: Option<Uuid>) -> Template {
        Template {
            id: Uuid::now_v7(),
            name: "T".into(),
            description: None,
            kind: "profile_template".into(),
            workspace_id,
            created_by: Uuid::nil(),
            created: Utc::now(),
            changed: Utc::now(),
        }
    }

    #[test]
    fn anonymous_caller_is_unauthenticated_not_forbidden() {
        let result = check_template_access(
            None,
            &HashSet::new(),
            &global_template(),
            TemplateAction::Edit,
        );
        assert!(matches!(result, Err(EditorError::Unauthenticated)));
    }

    #[test]
    fn both_admin_tiers_may_edit_global_templates() {
        for role in ["admin", "super_admin"] {
            let result = check_template_access(
                Some(&user(role)),
                &HashSet::new(),
                &global_template(),
                TemplateAction::Edit,
            );
            assert!(result.is_ok(), "role '{role}' should be allowed");
        }
    }

    #[test]
    fn member_may_not_edit_global_templates() {
        let result = check_template_access(
            Some(&user("member")),
            &HashSet::new(),
            &global_template(),
            TemplateAction::Edit,
        );
        assert!(matches!(result, Err(EditorError::Forbidden(_))));
    }

    #[test]
    fn deleting_global_template_requires_platform_admin() {
        let ws = Uuid::now_v7();
        let memberships: HashSet<Uuid> = [ws].into();
        // Workspace memberships grant nothing on global templates.
        let result = check_template_access(
            Some(&user("member")),
            &memberships,
            &global_template(),
            TemplateAction::Delete,
        );
        assert!(matches!(result, Err(EditorError::Forbidden(_))));

        let result = check_template_access(
            Some(&user("admin")),
            &HashSet::new(),
            &global_template(),
            TemplateAction::Delete,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn workspace_member_may_edit_own_workspace_template() {
        let ws = Uuid::now_v7();
        let memberships: HashSet<Uuid> = [ws].into();
        let result = check_template_access(
            Some(&user("member")),
            &memberships,
            &template_scoped(Some(ws)),
            TemplateAction::Edit,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn membership_in_workspace_a_grants_nothing_in_workspace_b() {
        let ws_a = Uuid::now_v7();
        let ws_b = Uuid::now_v7();
        let memberships: HashSet<Uuid> = [ws_a].into();
        let result = check_template_access(
            Some(&user("member")),
            &memberships,
            &template_scoped(Some(ws_b)),
            TemplateAction::Edit,
        );
        assert!(matches!(result, Err(EditorError::Forbidden(_))));
    }

    #[test]
    fn platform_admin_has_no_automatic_workspace_access() {
        // Tenant isolation: admins must be recorded members like anyone else.
        let ws = Uuid::now_v7();
        for role in ["admin", "super_admin"] {
            let result = check_template_access(
                Some(&user(role)),
                &HashSet::new(),
                &template_scoped(Some(ws)),
                TemplateAction::Edit,
            );
            assert!(
                matches!(result, Err(EditorError::Forbidden(_))),
                "role '{role}' must not bypass tenant isolation"
            );
        }
    }

    #[test]
    fn admin_who_is_also_a_member_may_edit() {
        let ws = Uuid::now_v7();
        let memberships: HashSet<Uuid> = [ws].into();
        let result = check_template_access(
            Some(&user("admin")),
            &memberships,
            &template_scoped(Some(ws)),
            TemplateAction::Edit,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn membership_management_requires_platform_admin() {
        assert!(matches!(
            check_platform_admin(None),
            Err(EditorError::Unauthenticated)
        ));
        assert!(matches!(
            check_platform_admin(Some(&user("member"))),
            Err(EditorError::Forbidden(_))
        ));
        for role in ["admin", "super_admin"] {
            assert!(check_platform_admin(Some(&user(role))).is_ok());
        }
    }

    #[test]
    fn listings_show_global_plus_own_workspaces_only() {
        let mine = Uuid::now_v7();
        let other = Uuid::now_v7();
        let memberships: HashSet<Uuid> = [mine].into();

        assert!(is_listed_for(TemplateScope::Global, &memberships));
        assert!(is_listed_for(TemplateScope::Workspace(mine), &memberships));
        assert!(!is_listed_for(TemplateScope::Workspace(other), &memberships));
        assert!(!is_listed_for(TemplateScope::Workspace(other), &HashSet::new()));
    }

    #[test]
    fn forbidden_reason_distinguishes_scope() {
        let Err(EditorError::Forbidden(reason)) = check_template_access(
            Some(&user("member")),
            &HashSet::new(),
            &global_template(),
            TemplateAction::Edit,
        ) else {
            panic!("expected Forbidden");
        };
        assert!(reason.contains("platform administrator"));

        let Err(EditorError::Forbidden(reason)) = check_template_access(
            Some(&user("member")),
            &HashSet::new(),
            &template_scoped(Some(Uuid::now_v7())),
            TemplateAction::Edit,
        ) else {
            panic!("expected Forbidden");
        };
        assert!(reason.contains("workspace"));
    }
}
