/**
 * User Model and Database Operations
 *
 * This module holds the server-side user record and its PostgreSQL queries.
 * The in-memory store keeps the same `User` values in a map.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::store::NewUser;
use crate::shared::messaging::UserSummary;

/// User struct representing a user in the database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID)
    pub id: Uuid,
    /// Display name
    pub full_name: String,
    /// User email address, stored lowercase
    pub email: String,
    /// Hashed password (bcrypt)
    pub password_hash: String,
    pub bio: Option<String>,
    /// Bumped on logout and password change; tokens carrying an older value are refused
    pub session_version: i64,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Public projection without the password hash
    pub fn to_summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            bio: self.bio.clone(),
        }
    }

    /// Case-insensitive keyword match on name or email
    pub fn matches(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.full_name.to_lowercase().contains(&keyword) || self.email.to_lowercase().contains(&keyword)
    }
}

const USER_COLUMNS: &str = "id, full_name, email, password_hash, bio, session_version, created_at, updated_at";

/// Normalize an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create a new user
///
/// Fails with a unique violation when the email is already registered.
pub async fn create_user(pool: &PgPool, new_user: NewUser) -> Result<User, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let query = format!(
        r#"
        INSERT INTO users (id, full_name, email, password_hash, bio, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {}
        "#,
        USER_COLUMNS
    );

    let user = sqlx::query_as::<_, User>(&query)
        .bind(id)
        .bind(&new_user.full_name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.bio)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

    Ok(user)
}

/// Get user by email
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, full_name, email, password_hash, bio, session_version, created_at, updated_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Get user by ID
pub async fn get_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, full_name, email, password_hash, bio, session_version, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Replace the profile fields of a user
pub async fn update_account(
    pool: &PgPool,
    id: Uuid,
    full_name: &str,
    bio: Option<&str>,
) -> Result<Option<User>, sqlx::Error> {
    let query = format!(
        r#"
        UPDATE users
        SET full_name = $2, bio = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        USER_COLUMNS
    );

    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .bind(full_name)
        .bind(bio)
        .fetch_optional(pool)
        .await
}

/// Store a new password hash and revoke every issued token in one statement
pub async fn set_password(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<Option<User>, sqlx::Error> {
    let query = format!(
        r#"
        UPDATE users
        SET password_hash = $2, session_version = session_version + 1, updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        USER_COLUMNS
    );

    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .bind(password_hash)
        .fetch_optional(pool)
        .await
}

/// Increment the session version, returning the new value
pub async fn bump_session_version(pool: &PgPool, id: Uuid) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE users
        SET session_version = session_version + 1, updated_at = NOW()
        WHERE id = $1
        RETURNING session_version
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Search users by name or email, excluding one user
pub async fn search_users(
    pool: &PgPool,
    keyword: &str,
    exclude: Uuid,
    limit: u32,
) -> Result<Vec<User>, sqlx::Error> {
    let pattern = format!("%{}%", escape_like(keyword));

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, full_name, email, password_hash, bio, session_version, created_at, updated_at
        FROM users
        WHERE id <> $1 AND (full_name ILIKE $2 OR email ILIKE $2)
        ORDER BY full_name
        LIMIT $3
        "#,
    )
    .bind(exclude)
    .bind(pattern)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Escape `%`, `_` and `\` so a keyword matches literally inside ILIKE
fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
