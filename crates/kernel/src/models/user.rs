//! User model — the identity collaborator surface.
//!
//! Authentication (login, passwords, sessions beyond the user-id lookup) is
//! out of scope; this model only answers "who is acting and what platform
//! role do they hold".

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Platform-level role of a user.
///
/// Both admin tiers qualify as platform administrators for global-template
/// mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Member,
    Admin,
    SuperAdmin,
}

impl UserRole {
    /// Parse a role from its stored text form. Unknown values degrade to
    /// the least-privileged role.
    pub fn parse(value: &str) -> Self {
        match value {
            "admin" => UserRole::Admin,
            "super_admin" => UserRole::SuperAdmin,
            _ => UserRole::Member,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Member => "member",
            UserRole::Admin => "admin",
            UserRole::SuperAdmin => "super_admin",
        }
    }
}

/// User record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub mail: String,
    pub role: String,
    pub status: i16,
    pub created: DateTime<Utc>,
}

/// Input for creating a new user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub mail: String,
    pub role: UserRole,
}

impl User {
    /// Parsed platform role.
    pub fn role(&self) -> UserRole {
        UserRole::parse(&self.role)
    }

    /// Whether this user holds either platform-admin tier.
    pub fn is_platform_admin(&self) -> bool {
        matches!(self.role(), UserRole::Admin | UserRole::SuperAdmin)
    }

    /// Check if this user is active.
    pub fn is_active(&self) -> bool {
        self.status == 1
    }

    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch user by id")?;

        Ok(user)
    }

    /// Create a new user.
    pub async fn create(pool: &PgPool, input: CreateUser) -> Result<Self> {
        let id = Uuid::now_v7();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, mail, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.mail)
        .bind(input.role.as_str())
        .fetch_one(pool)
        .await
        .context("failed to create user")?;

        Ok(user)
    }
}
