// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, deployment modes, and runtime configuration parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

//! Environment-based configuration management for production deployment

use crate::constants::limits;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Strongly typed log level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Environment type gating development-only behavior
///
/// Outside production, password reset links are echoed in API responses for
/// testability; in production they are only delivered out-of-band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Type-safe database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// SQLite database with file path
    SQLite { path: PathBuf },
    /// In-memory SQLite (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    #[must_use]
    pub fn parse_url(s: &str) -> Self {
        let path_str = s.strip_prefix("sqlite:").unwrap_or(s);
        if path_str == ":memory:" {
            Self::Memory
        } else {
            Self::SQLite {
                path: PathBuf::from(path_str),
            }
        }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_string(),
        }
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/symptohexe.db"),
        }
    }
}

impl std::fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Log level
    pub log_level: LogLevel,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// External service configuration
    pub external_services: ExternalServicesConfig,
    /// Application behavior settings
    pub app_behavior: AppBehaviorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite path or `:memory:`)
    pub url: DatabaseUrl,
    /// Enable database migrations on startup
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared JWT signing secret
    #[serde(skip_serializing)]
    pub jwt_secret: Vec<u8>,
    /// Account token expiry time in hours
    pub jwt_expiry_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalServicesConfig {
    /// Completion service (Gemini) configuration
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Gemini API key
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Gemini API base URL
    pub base_url: String,
    /// Default model identifier
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppBehaviorConfig {
    /// Base site URL used to construct password reset links
    pub site_url: String,
    /// Deployment environment
    pub environment: Environment,
    /// Server name for logging
    pub server_name: String,
    /// Server version (from Cargo.toml)
    pub server_version: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable holds an unparseable value
    /// or validation fails
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        drop(dotenvy::dotenv());

        let environment =
            Environment::from_str_or_default(&env_var_or("ENVIRONMENT", "development"));

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret.into_bytes(),
            Err(_) => {
                if environment.is_production() {
                    anyhow::bail!("JWT_SECRET must be set in production");
                }
                warn!("JWT_SECRET not set; generating an ephemeral secret (tokens will not survive restarts)");
                crate::auth::generate_jwt_secret().to_vec()
            }
        };

        let config = Self {
            http_port: env_var_or("HTTP_PORT", "8080")
                .parse()
                .context("Invalid HTTP_PORT value")?,
            log_level: LogLevel::from_str_or_default(&env_var_or("LOG_LEVEL", "info")),

            database: DatabaseConfig {
                url: DatabaseUrl::parse_url(&env_var_or(
                    "DATABASE_URL",
                    "sqlite:./data/symptohexe.db",
                )),
                auto_migrate: env_var_or("AUTO_MIGRATE", "true")
                    .parse()
                    .context("Invalid AUTO_MIGRATE value")?,
            },

            auth: AuthConfig {
                jwt_secret,
                jwt_expiry_hours: env_var_or(
                    "JWT_EXPIRY_HOURS",
                    &limits::DEFAULT_JWT_EXPIRY_HOURS.to_string(),
                )
                .parse()
                .context("Invalid JWT_EXPIRY_HOURS value")?,
            },

            external_services: ExternalServicesConfig {
                gemini: GeminiConfig {
                    api_key: env::var("GEMINI_API_KEY").ok(),
                    base_url: env_var_or(
                        "GEMINI_BASE_URL",
                        "https://generativelanguage.googleapis.com/v1beta",
                    ),
                    model: env_var_or("GEMINI_MODEL", "gemini-1.5-flash"),
                },
            },

            app_behavior: AppBehaviorConfig {
                site_url: env_var_or("SITE_URL", "http://localhost:3000"),
                environment,
                server_name: env_var_or("SERVER_NAME", "symptohexe-server"),
                server_version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error for configurations the server cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("JWT secret must not be empty");
        }

        if self.auth.jwt_expiry_hours <= 0 {
            anyhow::bail!("JWT_EXPIRY_HOURS must be positive");
        }

        if self.external_services.gemini.api_key.is_none() {
            if self.app_behavior.environment.is_production() {
                anyhow::bail!("GEMINI_API_KEY must be set in production");
            }
            warn!("GEMINI_API_KEY not set; AI doctor chat requests will fail upstream");
        }

        Ok(())
    }

    /// One-line configuration summary for startup logging
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} v{} ({}): port={}, database={}, model={}",
            self.app_behavior.server_name,
            self.app_behavior.server_version,
            self.app_behavior.environment,
            self.http_port,
            self.database.url,
            self.external_services.gemini.model,
        )
    }
}

/// Read an environment variable with a default fallback
fn env_var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_parsing() {
        assert!(matches!(
            DatabaseUrl::parse_url("sqlite::memory:"),
            DatabaseUrl::Memory
        ));
        assert!(matches!(
            DatabaseUrl::parse_url("sqlite:./data/app.db"),
            DatabaseUrl::SQLite { .. }
        ));
        assert_eq!(
            DatabaseUrl::parse_url("./plain/path.db").to_connection_string(),
            "sqlite:./plain/path.db"
        );
    }

    #[test]
    fn test_environment_parsing() {
        assert!(Environment::from_str_or_default("production").is_production());
        assert!(Environment::from_str_or_default("prod").is_production());
        assert!(!Environment::from_str_or_default("development").is_production());
        assert!(!Environment::from_str_or_default("anything-else").is_production());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str_or_default("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::from_str_or_default("bogus"), LogLevel::Info);
    }
}
