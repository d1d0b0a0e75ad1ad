use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid collection name: {0}")]
    InvalidCollectionName(String),

    #[error("Duplicate key: {0}")]
    Conflict(String),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Shared connection pool, opened once at startup and handed out as named collections.
pub struct DatabaseManager {
    pool: PgPool,
}

/// Handle to one table of the shared pool. Cheap to clone.
#[derive(Clone)]
pub struct Collection {
    name: String,
    pool: PgPool,
}

impl Collection {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Table name quoted for interpolation into SQL text.
    pub fn quoted_name(&self) -> String {
        DatabaseManager::quote_identifier(&self.name)
    }
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS opportunities (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        value DOUBLE PRECISION NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT '',
        user_id TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS opportunities_user_id_idx ON opportunities (user_id)",
];

impl DatabaseManager {
    pub const OPPORTUNITIES: &'static str = "opportunities";
    pub const USERS: &'static str = "users";

    /// Open the pool described by `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let base = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let connection_string = Self::build_connection_string(base, config.name.as_deref())?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&connection_string)
            .await?;

        info!(
            "Created database pool (max {} connections)",
            config.max_connections
        );
        Ok(Self { pool })
    }

    /// Get a handle on the named collection
    pub fn collection(&self, name: &str) -> Result<Collection, DatabaseError> {
        if !Self::is_valid_collection_name(name) {
            return Err(DatabaseError::InvalidCollectionName(name.to_string()));
        }
        Ok(Collection {
            name: name.to_string(),
            pool: self.pool.clone(),
        })
    }

    fn build_connection_string(base: &str, database_name: Option<&str>) -> Result<String, DatabaseError> {
        let mut url = url::Url::parse(base).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if let Some(name) = database_name {
            url.set_path(&format!("/{}", name));
        }
        Ok(url.into())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Create the tables this service needs if they are missing
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Schema is up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    /// Quote SQL identifier to prevent injection
    fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Lowercase ASCII letters, digits and underscores, not starting with a digit.
    fn is_valid_collection_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_lowercase() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }
}
