use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Fallback signing secret for local development only
const DEVELOPMENT_JWT_SECRET: &str = "development-only-jwt-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Reads `APP_ENV`; anything but `production`/`prod` is development
    pub fn from_env() -> Self {
        match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        }
    }

    /// Log filter used when `RUST_LOG` is unset
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Environment::Development => "character_api=debug,tower_http=info",
            Environment::Production => "character_api=info,tower_http=warn",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Json,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Json => "json",
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "db" => Ok(StoreBackend::Postgres),
            "json" | "file" => Ok(StoreBackend::Json),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub json_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: i64,
    pub max_limit: Option<i64>,
    pub sample_size: i64,
    /// Serve a random sample when a list request sends no `limit`, `skip` or `offset`
    pub sample_when_unpaged: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { default_limit: 20, max_limit: Some(1000), sample_size: 20, sample_when_unpaged: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
    pub jwt_expiry_hours: i64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown store backend: {0}")]
    UnknownBackend(String),

    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0} {1}")]
    Invalid(&'static str, &'static str),
}

impl AppConfig {
    /// Preset chosen by `APP_ENV`, then per-key overrides from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let preset = match Environment::from_env() {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        };
        preset.with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from `lookup`. Unparsable numbers keep the preset
    /// value; an unknown store backend is an error.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        fn parsed<T: std::str::FromStr>(value: Option<String>, current: T) -> T {
            value.and_then(|v| v.trim().parse().ok()).unwrap_or(current)
        }

        // Server overrides
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        self.server.port = parsed(lookup("CHARACTER_API_PORT").or_else(|| lookup("PORT")), self.server.port);

        // Store overrides
        if let Some(v) = lookup("STORE_BACKEND").filter(|v| !v.trim().is_empty()) {
            self.store.backend = v.parse()?;
        }
        if let Some(v) = lookup("CHARACTERS_JSON_PATH") {
            self.store.json_path = PathBuf::from(v);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v);
        }
        self.database.max_connections = parsed(lookup("DATABASE_MAX_CONNECTIONS"), self.database.max_connections);
        self.database.connection_timeout =
            parsed(lookup("DATABASE_CONNECTION_TIMEOUT"), self.database.connection_timeout);

        // Pagination overrides
        self.pagination.default_limit = parsed(lookup("PAGINATION_DEFAULT_LIMIT"), self.pagination.default_limit);
        self.pagination.max_limit =
            lookup("PAGINATION_MAX_LIMIT").and_then(|v| v.trim().parse().ok()).or(self.pagination.max_limit);
        self.pagination.sample_size = parsed(lookup("PAGINATION_SAMPLE_SIZE"), self.pagination.sample_size);
        self.pagination.sample_when_unpaged =
            parsed(lookup("PAGINATION_SAMPLE_WHEN_UNPAGED"), self.pagination.sample_when_unpaged);

        // Security overrides
        if let Some(v) = lookup("JWT_SECRET").filter(|v| !v.is_empty()) {
            self.security.jwt_secret = Some(v);
        }
        self.security.jwt_expiry_hours = parsed(lookup("JWT_EXPIRY_HOURS"), self.security.jwt_expiry_hours);

        Ok(self)
    }

    /// Checks settings that have no safe default for the selected backend/environment
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pagination = &self.pagination;
        for (key, value) in [
            ("PAGINATION_DEFAULT_LIMIT", Some(pagination.default_limit)),
            ("PAGINATION_MAX_LIMIT", pagination.max_limit),
            ("PAGINATION_SAMPLE_SIZE", Some(pagination.sample_size)),
        ] {
            if value.is_some_and(|v| v < 1) {
                return Err(ConfigError::Invalid(key, "must be at least 1"));
            }
        }
        if self.store.backend == StoreBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if self.security.jwt_secret.is_none() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { host: "0.0.0.0".to_string(), port: 3000 },
            store: StoreConfig { backend: StoreBackend::Json, json_path: PathBuf::from("data/characters.json") },
            database: DatabaseConfig { url: None, max_connections: 10, connection_timeout: 30 },
            pagination: PaginationConfig::default(),
            security: SecurityConfig {
                jwt_secret: Some(DEVELOPMENT_JWT_SECRET.to_string()),
                jwt_expiry_hours: 1,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { host: "0.0.0.0".to_string(), port: 3000 },
            store: StoreConfig { backend: StoreBackend::Json, json_path: PathBuf::from("data/characters.json") },
            database: DatabaseConfig { url: None, max_connections: 50, connection_timeout: 5 },
            pagination: PaginationConfig { max_limit: Some(100), ..PaginationConfig::default() },
            security: SecurityConfig { jwt_secret: None, jwt_expiry_hours: 1 },
        }
    }
}
