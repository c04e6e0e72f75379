/**
 * Server Configuration
 *
 * This module loads the server configuration and opens the database pool.
 *
 * # Configuration Sources
 *
 * Values are resolved in this order, later sources winning:
 * 1. Built-in defaults (`ServerConfig::default`)
 * 2. An optional TOML file named by `DOCQA_CONFIG`
 * 3. Environment variables (a `.env` file is loaded by `main` first)
 *
 * # Environment Variables
 *
 * | Variable | Default |
 * |----------|---------|
 * | `DATABASE_URL` | `sqlite://docqa.db` |
 * | `JWT_SECRET` | development fallback only |
 * | `JWT_ALGORITHM` | `HS256` |
 * | `ACCESS_TOKEN_EXPIRE_MINUTES` | `60` |
 * | `CORS_ALLOWED_ORIGINS` | empty (permissive) |
 * | `STORAGE_PATH` | `uploads` |
 * | `SERVER_PORT` | `3000` |
 * | `REPLY_BACKEND_URL` | unset (stub replies) |
 * | `REPLY_TIMEOUT_SECS` | `30` |
 * | `FREE_TIER_MAX_DOCUMENTS` | `3` |
 * | `PASSWORD_HASH_COST` | bcrypt default |
 * | `LOG_FILTER` | `info` |
 * | `APP_ENV` | `development` |
 */

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use thiserror::Error;

use crate::shared::tier::FREE_TIER_MAX_DOCUMENTS;

/// How long a connection waits on another writer before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// bcrypt accepts costs in this range
pub const MIN_HASH_COST: u32 = 4;
pub const MAX_HASH_COST: u32 = 31;

/// Secret used when `JWT_SECRET` is absent outside production
const DEVELOPMENT_JWT_SECRET: &str = "docqa-development-secret-change-me";

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("JWT_SECRET must be set when APP_ENV=production")]
    MissingSecret,
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: Option<String>,
    pub jwt_algorithm: String,
    pub access_token_expire_minutes: i64,
    pub cors_allowed_origins: Vec<String>,
    pub storage_path: PathBuf,
    pub server_port: u16,
    pub reply_backend_url: Option<String>,
    pub reply_timeout_secs: u64,
    pub free_tier_max_documents: i64,
    pub password_hash_cost: u32,
    pub log_filter: String,
    pub app_env: AppEnv,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://docqa.db".to_string(),
            jwt_secret: None,
            jwt_algorithm: "HS256".to_string(),
            access_token_expire_minutes: 60,
            cors_allowed_origins: Vec::new(),
            storage_path: PathBuf::from("uploads"),
            server_port: 3000,
            reply_backend_url: None,
            reply_timeout_secs: 30,
            free_tier_max_documents: FREE_TIER_MAX_DOCUMENTS,
            password_hash_cost: bcrypt::DEFAULT_COST,
            log_filter: "info".to_string(),
            app_env: AppEnv::Development,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the optional TOML file and the environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, if an
    /// environment variable holds an unparsable value, or if validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("DOCQA_CONFIG") {
            Ok(path) => {
                let path = PathBuf::from(path);
                let raw = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
                tracing::info!("Loaded configuration file {}", path.display());
                Self::from_toml_str(&raw)?
            }
            Err(_) => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Override fields from environment-style key lookups
    ///
    /// # Arguments
    ///
    /// * `lookup` - Returns the value for a variable name, if set
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt_secret = Some(secret);
        }
        if let Some(algorithm) = lookup("JWT_ALGORITHM") {
            self.jwt_algorithm = algorithm;
        }
        if let Some(minutes) = lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            self.access_token_expire_minutes = parse_var("ACCESS_TOKEN_EXPIRE_MINUTES", &minutes)?;
        }
        if let Some(origins) = lookup("CORS_ALLOWED_ORIGINS") {
            self.cors_allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(path) = lookup("STORAGE_PATH") {
            self.storage_path = PathBuf::from(path);
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server_port = parse_var("SERVER_PORT", &port)?;
        }
        if let Some(url) = lookup("REPLY_BACKEND_URL") {
            self.reply_backend_url = Some(url).filter(|url| !url.is_empty());
        }
        if let Some(secs) = lookup("REPLY_TIMEOUT_SECS") {
            self.reply_timeout_secs = parse_var("REPLY_TIMEOUT_SECS", &secs)?;
        }
        if let Some(cap) = lookup("FREE_TIER_MAX_DOCUMENTS") {
            self.free_tier_max_documents = parse_var("FREE_TIER_MAX_DOCUMENTS", &cap)?;
        }
        if let Some(cost) = lookup("PASSWORD_HASH_COST") {
            self.password_hash_cost = parse_var("PASSWORD_HASH_COST", &cost)?;
        }
        if let Some(filter) = lookup("LOG_FILTER") {
            self.log_filter = filter;
        }
        if let Some(env) = lookup("APP_ENV") {
            self.app_env = match env.to_ascii_lowercase().as_str() {
                "production" | "prod" => AppEnv::Production,
                "development" | "dev" => AppEnv::Development,
                _ => return Err(ConfigError::InvalidValue { key: "APP_ENV", value: env }),
            };
        }
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_env == AppEnv::Production && self.jwt_secret.is_none() {
            return Err(ConfigError::MissingSecret);
        }
        self.algorithm()?;
        if self.access_token_expire_minutes <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                value: self.access_token_expire_minutes.to_string(),
            });
        }
        if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&self.password_hash_cost) {
            return Err(ConfigError::InvalidValue {
                key: "PASSWORD_HASH_COST",
                value: self.password_hash_cost.to_string(),
            });
        }
        if self.free_tier_max_documents < 0 {
            return Err(ConfigError::InvalidValue {
                key: "FREE_TIER_MAX_DOCUMENTS",
                value: self.free_tier_max_documents.to_string(),
            });
        }
        Ok(())
    }

    /// Token signing secret, falling back to a development value
    pub fn jwt_secret(&self) -> &str {
        match &self.jwt_secret {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEVELOPMENT_JWT_SECRET
            }
        }
    }

    /// HMAC signing algorithm for session tokens
    pub fn algorithm(&self) -> Result<Algorithm, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: "JWT_ALGORITHM",
            value: self.jwt_algorithm.clone(),
        };
        match Algorithm::from_str(&self.jwt_algorithm.to_ascii_uppercase()) {
            Ok(algorithm @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(algorithm),
            _ => Err(invalid()),
        }
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_expire_minutes)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }

    /// Configuration for tests: in-memory database, fixed secret, cheap hashing
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: Some("docqa-test-secret".to_string()),
            password_hash_cost: MIN_HASH_COST,
            reply_timeout_secs: 5,
            ..Self::default()
        }
    }
}

fn parse_var<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

/// Open the SQLite pool and apply migrations
///
/// In-memory databases live as long as their connection, so they are pinned
/// to a single connection that is never recycled.
///
/// # Errors
///
/// Returns the sqlx error if the url is invalid, the connection fails, or a
/// migration fails.
pub async fn load_database(config: &ServerConfig) -> Result<SqlitePool, sqlx::Error> {
    tracing::info!("Connecting to database...");

    let in_memory = config.database_url.contains(":memory:");
    let mut options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(8)
    };
    let pool = pool_options.connect_with(options).await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database ready");

    Ok(pool)
}

/// Open a transaction holding the write lock from its first statement
///
/// In WAL mode a deferred transaction that reads before it writes fails with
/// `SQLITE_BUSY` instead of waiting once another connection has committed.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}
