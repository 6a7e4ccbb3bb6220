/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration and
 * opening the SQLite connection pool.
 *
 * # Configuration Sources
 *
 * Configuration is read from environment variables (a `.env` file is loaded
 * first by the binary), with defaults suitable for local development:
 *
 * | Variable                   | Default                        |
 * |----------------------------|--------------------------------|
 * | `BIND_ADDR`                | `0.0.0.0:8080`                 |
 * | `DATABASE_URL`             | `sqlite://chatflow.db?mode=rwc`|
 * | `JWT_SECRET`               | required                       |
 * | `DATABASE_MAX_CONNECTIONS` | `8`                            |
 * | `OUTBOUND_BUFFER`          | `256`                          |
 *
 * # Error Handling
 *
 * Unlike optional integrations, the database and the token secret are
 * required: a missing secret or an unreachable database stops startup.
 */

use std::net::SocketAddr;
use std::time::Duration;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::info;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DATABASE_URL: &str = "sqlite://chatflow.db?mode=rwc";
const DEFAULT_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_OUTBOUND_BUFFER: usize = 256;
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("failed to open database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to run migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,
    /// SQLite connection string
    pub database_url: String,
    /// HS256 secret used to verify bearer tokens
    pub jwt_secret: String,
    pub database_max_connections: u32,
    /// Capacity of each connection's outbound event queue
    pub outbound_buffer: usize,
    /// Lifetime of tokens issued by `JwtAuth::create_token`
    pub token_ttl_hours: i64,
}

impl ServerConfig {
    /// Create a new ServerConfigBuilder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(addr) = lookup("BIND_ADDR") {
            builder = builder.bind_addr(parse_value("BIND_ADDR", &addr)?);
        }
        if let Some(url) = lookup("DATABASE_URL") {
            builder = builder.database_url(url);
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            builder = builder.jwt_secret(secret);
        }
        if let Some(max) = lookup("DATABASE_MAX_CONNECTIONS") {
            builder = builder.database_max_connections(parse_value("DATABASE_MAX_CONNECTIONS", &max)?);
        }
        if let Some(buffer) = lookup("OUTBOUND_BUFFER") {
            builder = builder.outbound_buffer(parse_value("OUTBOUND_BUFFER", &buffer)?);
        }
        if let Some(ttl) = lookup("TOKEN_TTL_HOURS") {
            builder = builder.token_ttl_hours(parse_value("TOKEN_TTL_HOURS", &ttl)?);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        if self.database_max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }
        if self.outbound_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                key: "OUTBOUND_BUFFER",
                value: "0".to_string(),
            });
        }
        if self.token_ttl_hours <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "TOKEN_TTL_HOURS",
                value: self.token_ttl_hours.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

/// Builder for ServerConfig
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    bind_addr: Option<SocketAddr>,
    database_url: Option<String>,
    jwt_secret: Option<String>,
    database_max_connections: Option<u32>,
    outbound_buffer: Option<usize>,
    token_ttl_hours: Option<i64>,
}

impl ServerConfigBuilder {
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = Some(addr);
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    pub fn database_max_connections(mut self, max: u32) -> Self {
        self.database_max_connections = Some(max);
        self
    }

    pub fn outbound_buffer(mut self, capacity: usize) -> Self {
        self.outbound_buffer = Some(capacity);
        self
    }

    pub fn token_ttl_hours(mut self, hours: i64) -> Self {
        self.token_ttl_hours = Some(hours);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let bind_addr = match self.bind_addr {
            Some(addr) => addr,
            None => parse_value("BIND_ADDR", DEFAULT_BIND_ADDR)?,
        };

        let config = ServerConfig {
            bind_addr,
            database_url: self
                .database_url
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            jwt_secret: self.jwt_secret.ok_or(ConfigError::MissingValue("JWT_SECRET"))?,
            database_max_connections: self
                .database_max_connections
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            outbound_buffer: self.outbound_buffer.unwrap_or(DEFAULT_OUTBOUND_BUFFER),
            token_ttl_hours: self.token_ttl_hours.unwrap_or(DEFAULT_TOKEN_TTL_HOURS),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Open the connection pool and run database migrations
///
/// This function:
/// 1. Creates a SQLite connection pool for `config.database_url`
/// 2. Runs the embedded migrations from `migrations/`
///
/// In-memory databases are private to one connection, so the pool is pinned
/// to a single long-lived connection for them.
pub async fn load_database(config: &ServerConfig) -> Result<SqlitePool, ConfigError> {
    info!("[Server] Connecting to database...");

    let in_memory = config.database_url.contains(":memory:");
    let options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(10))
    };

    let pool = options.connect(&config.database_url).await?;
    info!("[Server] Database connection pool created successfully");

    info!("[Server] Running database migrations...");
    sqlx::migrate!().run(&pool).await?;
    info!("[Server] Database migrations completed successfully");

    Ok(pool)
}
