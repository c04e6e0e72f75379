/**
 * User Model and Database Operations
 *
 * This module holds the `User` row type and the queries over the `users`
 * table. Queries return raw `sqlx::Error`; the identity service translates
 * them into `BackendError`.
 */

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteExecutor};
use uuid::Uuid;

use crate::shared::AccountTier;

/// User struct representing a user in the database
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Unique user ID (UUID)
    pub id: Uuid,
    /// Username (unique, immutable after registration)
    pub username: String,
    /// Optional unique email address
    pub email: Option<String>,
    /// Hashed password (bcrypt)
    pub password_hash: String,
    pub account_tier: AccountTier,
    pub is_active: bool,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for User {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let tier: String = row.try_get("account_tier")?;
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            account_tier: tier.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "account_tier".to_string(),
                source: Box::new(e),
            })?,
            is_active: row.try_get("is_active")?,
            full_name: row.try_get("full_name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Public view of a user; never includes the password hash
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub account_tier: AccountTier,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            account_tier: user.account_tier,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// Fields for a new user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password_hash: String,
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, account_tier, is_active, full_name, created_at, updated_at";

/// Create a new user with the Basic tier
///
/// # Errors
/// A unique violation on `username` or `email` surfaces as `sqlx::Error::Database`
pub async fn create_user(
    executor: impl SqliteExecutor<'_>,
    new_user: NewUser,
) -> Result<User, sqlx::Error> {
    let now = Utc::now();

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, username, email, password_hash, account_tier, is_active, full_name, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 1, ?, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&new_user.username)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(AccountTier::Basic.as_str())
    .bind(&new_user.full_name)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(user)
}

/// Get user by ID
pub async fn get_user_by_id(
    executor: impl SqliteExecutor<'_>,
    id: Uuid,
) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(user)
}

/// Get user by username
pub async fn get_user_by_username(
    executor: impl SqliteExecutor<'_>,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
        .bind(username)
        .fetch_optional(executor)
        .await?;

    Ok(user)
}

/// Get user by email
pub async fn get_user_by_email(
    executor: impl SqliteExecutor<'_>,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(executor)
        .await?;

    Ok(user)
}

/// Update display name and/or email; `None` keeps the stored value
pub async fn update_profile(
    executor: impl SqliteExecutor<'_>,
    id: Uuid,
    full_name: Option<&str>,
    email: Option<&str>,
) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET full_name = COALESCE(?, full_name),
            email = COALESCE(?, email),
            updated_at = ?
        WHERE id = ?
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(full_name)
    .bind(email)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

pub async fn update_password_hash(
    executor: impl SqliteExecutor<'_>,
    id: Uuid,
    password_hash: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Set the account tier; returns the updated user
pub async fn set_account_tier(
    executor: impl SqliteExecutor<'_>,
    id: Uuid,
    tier: AccountTier,
) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET account_tier = ?, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}"
    ))
    .bind(tier.as_str())
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

/// Set the active flag; returns false when the user does not exist
pub async fn set_active(
    executor: impl SqliteExecutor<'_>,
    id: Uuid,
    active: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
        .bind(active)
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// List users ordered by registration time
pub async fn list_users(
    executor: impl SqliteExecutor<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, sqlx::Error> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, username ASC LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await?;

    Ok(users)
}

/// Delete a user; owned rows go with it through `ON DELETE CASCADE`
pub async fn delete_user(executor: impl SqliteExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() == 1)
}
