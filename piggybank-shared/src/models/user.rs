/// User model and database operations
///
/// Users are not authenticated by this service. Each row is linked to an
/// identity issued by an external provider through `auth_id`, which is the
/// `sub` claim of the bearer token.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     auth_id VARCHAR(255) NOT NULL UNIQUE,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     avatar_url VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Deleting a user cascades to their transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// User model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: i64,

    /// Subject identifier from the external identity provider
    pub auth_id: String,

    /// Email address (unique)
    pub email: String,

    /// Display name
    pub name: String,

    /// Optional avatar/profile picture URL
    pub avatar_url: Option<String>,

    /// When the user was registered
    pub created_at: DateTime<Utc>,

    /// When the profile was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub auth_id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Input for updating a profile
///
/// Only non-None fields are updated. Use `avatar_url: Some(None)` to clear
/// the avatar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub avatar_url: Option<Option<String>>,
}

const COLUMNS: &str = "id, auth_id, email, name, avatar_url, created_at, updated_at";

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique constraint violation if `auth_id` or `email` is
    /// already registered.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (auth_id, email, name, avatar_url) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.auth_id)
            .bind(data.email)
            .bind(data.name)
            .bind(data.avatar_url)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by external auth subject
    pub async fn find_by_auth_id(pool: &PgPool, auth_id: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE auth_id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(auth_id)
            .fetch_optional(pool)
            .await
    }

    /// Updates a user's profile
    ///
    /// Returns `None` if the user doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.avatar_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", avatar_url = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(avatar_url) = data.avatar_url {
            q = q.bind(avatar_url);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a user and, through the foreign key, all their transactions
    ///
    /// Returns false if the user didn't exist.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
