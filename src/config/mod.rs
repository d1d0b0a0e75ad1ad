use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    /// Overrides the database named in the path of `url`.
    pub name: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    /// Upper bound for a single store operation.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// bcrypt work factor for new password hashes.
    pub password_cost: u32,
    pub session_cookie: String,
    pub require_https: bool,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set")]
    MissingJwtSecret,

    #[error("DATABASE_URL must be set when STORE_BACKEND=postgres")]
    MissingDatabaseUrl,

    #[error("Session cookie name must not be empty")]
    EmptyCookieName,

    #[error("JWT expiry must be between 1 and 8760 hours, got {0}")]
    InvalidJwtExpiry(u64),

    #[error("Password cost must be between 4 and 31, got {0}")]
    InvalidPasswordCost(u32),
}

/// One year. Longer sessions overflow token and cookie lifetimes.
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;

/// Work factor range accepted by bcrypt.
pub const MIN_PASSWORD_COST: u32 = 4;
pub const MAX_PASSWORD_COST: u32 = 31;

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("OPPORTUNITY_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.database.backend = match v.to_ascii_lowercase().as_str() {
                "memory" | "mem" => StoreBackend::Memory,
                "postgres" | "pg" => StoreBackend::Postgres,
                _ => self.database.backend,
            };
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_NAME") {
            self.database.name = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_REQUEST_TIMEOUT_SECS") {
            self.database.request_timeout_secs = v.parse().unwrap_or(self.database.request_timeout_secs);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_PASSWORD_COST") {
            self.security.password_cost = v.parse().unwrap_or(self.security.password_cost);
        }
        if let Ok(v) = env::var("SECURITY_SESSION_COOKIE") {
            self.security.session_cookie = v;
        }
        if let Ok(v) = env::var("SECURITY_REQUIRE_HTTPS") {
            self.security.require_https = v.parse().unwrap_or(self.security.require_https);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    /// Checks the settings that have no safe default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }
        if self.security.session_cookie.trim().is_empty() {
            return Err(ConfigError::EmptyCookieName);
        }
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&self.security.jwt_expiry_hours) {
            return Err(ConfigError::InvalidJwtExpiry(self.security.jwt_expiry_hours));
        }
        if !(MIN_PASSWORD_COST..=MAX_PASSWORD_COST).contains(&self.security.password_cost) {
            return Err(ConfigError::InvalidPasswordCost(self.security.password_cost));
        }
        if self.database.backend == StoreBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.database.request_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                name: None,
                max_connections: 10,
                connection_timeout: 30,
                request_timeout_secs: 100,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                jwt_secret: "development-only-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                password_cost: bcrypt::DEFAULT_COST,
                session_cookie: "token".to_string(),
                require_https: false,
                enable_cors: true,
                cors_origins: vec!["*".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                name: None,
                max_connections: 20,
                connection_timeout: 10,
                request_timeout_secs: 100,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 512 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                password_cost: bcrypt::DEFAULT_COST,
                session_cookie: "token".to_string(),
                require_https: true,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                name: None,
                max_connections: 50,
                connection_timeout: 5,
                request_timeout_secs: 100,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                password_cost: bcrypt::DEFAULT_COST,
                session_cookie: "token".to_string(),
                require_https: true,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }

    /// In-memory store, fixed secret. Used by tests and `STORE_BACKEND=memory` runs.
    pub fn for_memory_store(jwt_secret: impl Into<String>) -> Self {
        let mut config = Self::development();
        config.database.backend = StoreBackend::Memory;
        config.security.jwt_secret = jwt_secret.into();
        config.security.password_cost = MIN_PASSWORD_COST;
        config.api.enable_request_logging = false;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.request_timeout_secs, 100);
        assert_eq!(config.security.session_cookie, "token");
        assert!(!config.security.require_https);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.require_https);
        assert!(!config.api.enable_request_logging);
        assert_eq!(config.validate(), Err(ConfigError::MissingJwtSecret));
    }

    #[test]
    fn postgres_backend_requires_url() {
        let mut config = AppConfig::development();
        assert_eq!(config.validate(), Err(ConfigError::MissingDatabaseUrl));

        config.database.url = Some("postgres://localhost/opportunities".to_string());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn memory_config_is_valid_without_url() {
        let config = AppConfig::for_memory_store("s3cret");
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.request_timeout(), Duration::from_secs(100));
    }

    #[test]
    fn jwt_expiry_is_bounded() {
        let mut config = AppConfig::for_memory_store("s");
        config.security.jwt_expiry_hours = MAX_JWT_EXPIRY_HOURS;
        assert_eq!(config.validate(), Ok(()));

        for hours in [0, MAX_JWT_EXPIRY_HOURS + 1, u64::MAX] {
            config.security.jwt_expiry_hours = hours;
            assert_eq!(config.validate(), Err(ConfigError::InvalidJwtExpiry(hours)));
        }
    }

    #[test]
    fn password_cost_is_bounded() {
        let mut config = AppConfig::for_memory_store("s");
        config.security.password_cost = 3;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPasswordCost(3)));

        config.security.password_cost = 32;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPasswordCost(32)));
    }

    #[test]
    fn secret_is_not_serialized() {
        let config = AppConfig::for_memory_store("do-not-print");
        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("do-not-print"));
    }
}
