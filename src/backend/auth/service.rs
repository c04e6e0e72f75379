/**
 * Identity & Entitlement Service
 *
 * `IdentityService` owns registration, authentication, session issue and
 * every mutation of a user record. Tier checks use the total order
 * Basic < Premium < Moderator through `authorize`.
 *
 * # Validation
 *
 * - Username: 3-30 characters, letters, digits and underscores
 * - Password: at least 8 characters
 * - Email: must contain '@'
 *
 * # Security
 *
 * - Passwords are hashed with bcrypt at the configured cost
 * - Plaintext passwords and tokens are never logged
 * - Unknown user and wrong password both surface as `InvalidCredentials`
 */

use std::sync::Arc;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::backend::auth::sessions::SessionCodec;
use crate::backend::auth::users::{self, NewUser, User};
use crate::backend::documents::db as documents_db;
use crate::backend::documents::storage::DocumentStorage;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::server::config::begin_write;
use crate::shared::pagination::USERS_PER_PAGE;
use crate::shared::{AccountTier, Page};

/// Registration input
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: String,
}

/// Identity store and session issuer
#[derive(Clone)]
pub struct IdentityService {
    pool: SqlitePool,
    sessions: SessionCodec,
    hash_cost: u32,
    storage: Arc<dyn DocumentStorage>,
}

impl IdentityService {
    pub fn new(
        pool: SqlitePool,
        sessions: SessionCodec,
        hash_cost: u32,
        storage: Arc<dyn DocumentStorage>,
    ) -> Self {
        Self {
            pool,
            sessions,
            hash_cost,
            storage,
        }
    }

    /// Register a new Basic user
    ///
    /// # Errors
    ///
    /// * `UnprocessableInput` - username, email or password fails validation
    /// * `Conflict` - username or email already taken
    pub async fn register(&self, request: RegisterUser) -> BackendResult<User> {
        validate_username(&request.username)?;
        validate_password(&request.password)?;
        if let Some(email) = &request.email {
            validate_email(email)?;
        }

        if users::get_user_by_username(&self.pool, &request.username).await?.is_some() {
            tracing::warn!("Username already exists: {}", request.username);
            return Err(BackendError::conflict("Username already taken"));
        }
        if let Some(email) = &request.email {
            if users::get_user_by_email(&self.pool, email).await?.is_some() {
                tracing::warn!("Email already exists: {}", email);
                return Err(BackendError::conflict("Email already registered"));
            }
        }

        let password_hash = self.hash(&request.password)?;
        let user = users::create_user(
            &self.pool,
            NewUser {
                username: request.username,
                email: request.email,
                full_name: request.full_name,
                password_hash,
            },
        )
        .await?;

        tracing::info!("User created successfully: {}", user.username);
        Ok(user)
    }

    /// Check a username (or email) and password pair
    ///
    /// # Errors
    ///
    /// * `InvalidCredentials` - unknown user or wrong password
    /// * `AccountDeactivated` - correct credentials for a deactivated user
    pub async fn authenticate(&self, login: &str, password: &str) -> BackendResult<User> {
        let mut user = users::get_user_by_username(&self.pool, login).await?;
        if user.is_none() && login.contains('@') {
            user = users::get_user_by_email(&self.pool, login).await?;
        }
        let Some(user) = user else {
            tracing::warn!("Login attempt for unknown user: {}", login);
            return Err(BackendError::InvalidCredentials);
        };

        if !self.verify_password(password, &user.password_hash)? {
            tracing::warn!("Invalid password for user: {}", user.username);
            return Err(BackendError::InvalidCredentials);
        }
        if !user.is_active {
            tracing::warn!("Login attempt for deactivated user: {}", user.username);
            return Err(BackendError::AccountDeactivated);
        }

        Ok(user)
    }

    /// Sign a session token for a user
    pub fn issue_session(&self, user: &User) -> BackendResult<String> {
        self.sessions.issue(user)
    }

    /// Verify a bearer token and load its user
    ///
    /// Deactivation does not invalidate issued tokens, so the active flag is
    /// checked against the stored row on every request.
    ///
    /// # Errors
    ///
    /// * `InvalidAuthToken` - bad signature, expired, or the user no longer exists
    /// * `AccountDeactivated` - the user has been deactivated
    pub async fn resolve_session(&self, token: &str) -> BackendResult<User> {
        let claims = self.sessions.verify(token)?;
        let user = users::get_user_by_id(&self.pool, claims.user_id()?)
            .await?
            .ok_or_else(|| BackendError::invalid_token("user no longer exists"))?;
        if !user.is_active {
            return Err(BackendError::AccountDeactivated);
        }
        Ok(user)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> BackendResult<User> {
        users::get_user_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| BackendError::not_found("User not found"))
    }

    pub async fn get_profile_by_username(&self, username: &str) -> BackendResult<User> {
        users::get_user_by_username(&self.pool, username)
            .await?
            .ok_or_else(|| BackendError::not_found(format!("User {username} not found")))
    }

    /// Update display name and/or email
    ///
    /// # Errors
    /// `Conflict` if the new email belongs to another user
    pub async fn update_profile(
        &self,
        user: &User,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> BackendResult<User> {
        if let Some(email) = email {
            validate_email(email)?;
            if let Some(existing) = users::get_user_by_email(&self.pool, email).await? {
                if existing.id != user.id {
                    return Err(BackendError::conflict("Email already registered"));
                }
            }
        }

        users::update_profile(&self.pool, user.id, full_name, email)
            .await?
            .ok_or_else(|| BackendError::not_found("User not found"))
    }

    /// Replace the password after checking the current one
    pub async fn change_password(&self, user: &User, current: &str, new: &str) -> BackendResult<()> {
        if !self.verify_password(current, &user.password_hash)? {
            tracing::warn!("Password change with wrong current password: {}", user.username);
            return Err(BackendError::InvalidCredentials);
        }
        validate_password(new)?;

        let password_hash = self.hash(new)?;
        users::update_password_hash(&self.pool, user.id, &password_hash).await?;
        tracing::info!("Password updated for user: {}", user.username);
        Ok(())
    }

    /// Set a user's tier directly; repeating the same tier is a no-op
    pub async fn set_tier(&self, user_id: Uuid, tier: AccountTier) -> BackendResult<User> {
        let user = users::set_account_tier(&self.pool, user_id, tier)
            .await?
            .ok_or_else(|| BackendError::not_found("User not found"))?;
        tracing::info!("User {} is now {}", user.username, tier);
        Ok(user)
    }

    /// Self-service tier change; Moderator cannot be self-granted
    pub async fn change_own_tier(&self, user: &User, tier: AccountTier) -> BackendResult<User> {
        if tier == AccountTier::Moderator {
            return Err(BackendError::forbidden(
                "the Moderator tier can only be granted by a moderator",
            ));
        }
        self.set_tier(user.id, tier).await
    }

    /// Moderator-only tier change for any user
    pub async fn grant_tier(&self, actor: &User, user_id: Uuid, tier: AccountTier) -> BackendResult<User> {
        authorize(actor, AccountTier::Moderator, "changing another user's tier")?;
        self.set_tier(user_id, tier).await
    }

    pub async fn activate(&self, user_id: Uuid) -> BackendResult<()> {
        self.set_active(user_id, true).await
    }

    pub async fn deactivate(&self, user_id: Uuid) -> BackendResult<()> {
        self.set_active(user_id, false).await
    }

    /// Moderator-only activation toggle for any user
    pub async fn moderate_activation(&self, actor: &User, user_id: Uuid, active: bool) -> BackendResult<()> {
        authorize(actor, AccountTier::Moderator, "activating or deactivating users")?;
        self.set_active(user_id, active).await
    }

    async fn set_active(&self, user_id: Uuid, active: bool) -> BackendResult<()> {
        if !users::set_active(&self.pool, user_id, active).await? {
            return Err(BackendError::not_found("User not found"));
        }
        tracing::info!(
            "User {} {}",
            user_id,
            if active { "activated" } else { "deactivated" }
        );
        Ok(())
    }

    /// One page of users, Moderator only
    pub async fn list_users(&self, actor: &User, page: Page) -> BackendResult<Vec<User>> {
        authorize(actor, AccountTier::Moderator, "listing users")?;
        let (limit, offset) = page.limit_offset(USERS_PER_PAGE);
        Ok(users::list_users(&self.pool, limit, offset).await?)
    }

    /// Look up any user by username, Moderator only
    pub async fn find_user(&self, actor: &User, username: &str) -> BackendResult<User> {
        authorize(actor, AccountTier::Moderator, "looking up users")?;
        self.get_profile_by_username(username).await
    }

    /// Delete a user with everything they own, Moderator only
    ///
    /// Rows go through `ON DELETE CASCADE`; stored bytes are removed after the
    /// database commit.
    pub async fn delete_user(&self, actor: &User, user_id: Uuid) -> BackendResult<()> {
        authorize(actor, AccountTier::Moderator, "deleting users")?;

        let mut tx = begin_write(&self.pool).await?;
        let locators = documents_db::locators_for_owner(&mut *tx, user_id).await?;
        if !users::delete_user(&mut *tx, user_id).await? {
            return Err(BackendError::not_found("User not found"));
        }
        tx.commit().await?;

        for locator in &locators {
            if let Err(e) = self.storage.delete(locator).await {
                tracing::warn!("Failed to remove stored document {}: {}", locator, e);
            }
        }
        tracing::info!(
            "User {} deleted by {} ({} stored documents removed)",
            user_id,
            actor.username,
            locators.len()
        );
        Ok(())
    }

    fn hash(&self, password: &str) -> BackendResult<String> {
        bcrypt::hash(password, self.hash_cost).map_err(|e| {
            tracing::error!("Failed to hash password: {:?}", e);
            BackendError::internal("password hashing failed")
        })
    }

    fn verify_password(&self, password: &str, hash: &str) -> BackendResult<bool> {
        bcrypt::verify(password, hash).map_err(|e| {
            tracing::error!("Failed to verify password hash: {:?}", e);
            BackendError::internal("password verification failed")
        })
    }
}

/// Compare a user's tier against a required tier
///
/// # Errors
/// `Forbidden` when the tier is insufficient
pub fn authorize(user: &User, required: AccountTier, action: &str) -> BackendResult<()> {
    if user.account_tier.allows(required) {
        Ok(())
    } else {
        tracing::debug!(
            "User {} ({}) denied {}: requires {}",
            user.username,
            user.account_tier,
            action,
            required
        );
        Err(BackendError::forbidden(format!("{action} requires the {required} tier")))
    }
}

/// Usernames are 3-30 characters of letters, digits and underscores
pub fn validate_username(username: &str) -> BackendResult<()> {
    let valid_len = (3..=30).contains(&username.chars().count());
    let valid_chars = username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid_len && valid_chars {
        Ok(())
    } else {
        Err(BackendError::unprocessable(
            "username",
            "Username must be 3-30 chars and contain only letters, numbers, and underscores",
        ))
    }
}

pub fn validate_password(password: &str) -> BackendResult<()> {
    if password.chars().count() < 8 {
        return Err(BackendError::unprocessable(
            "password",
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> BackendResult<()> {
    if !email.contains('@') {
        return Err(BackendError::unprocessable("email", "Invalid email format"));
    }
    Ok(())
}
