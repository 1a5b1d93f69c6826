use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

/// Longest accepted session lifetime: one year.
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Command-line flags for the `devconnect` binary.
#[derive(Debug, Parser)]
#[command(name = "devconnect", about = "Developer social network API server")]
pub struct Cli {
    /// Configuration file (TOML), extension optional. Missing files are ignored.
    #[arg(long, default_value = "config/devconnect")]
    pub config: String,

    /// Override `server.port`.
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub mongodb: MongoConfig,
    pub auth: AuthConfig,
    pub github: GithubConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign session tokens.
    #[serde(default)]
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    pub api_url: String,
    #[serde(default)]
    pub token: Option<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub per_page: u8,
}

impl GithubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> chrono::Duration {
        i64::try_from(self.token_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// Load configuration: built-in defaults, then the optional file at
    /// `path`, then `DEVCONNECT__*` environment variables.
    pub fn load(path: &str) -> Result<Self, AppError> {
        Self::load_with_env(path, Environment::with_prefix("DEVCONNECT").separator("__"))
    }

    fn load_with_env(path: &str, env: Environment) -> Result<Self, AppError> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")
            .and_then(|b| b.set_default("server.port", 5000))
            .and_then(|b| b.set_default("mongodb.uri", "mongodb://localhost:27017"))
            .and_then(|b| b.set_default("mongodb.database", "devconnect"))
            .and_then(|b| b.set_default("auth.token_ttl_secs", 3600))
            .and_then(|b| b.set_default("github.api_url", "https://api.github.com"))
            .and_then(|b| b.set_default("github.user_agent", "devconnect"))
            .and_then(|b| b.set_default("github.timeout_secs", 5))
            .and_then(|b| b.set_default("github.per_page", 5))
            .map_err(config_error)?
            .add_source(File::with_name(path).required(false))
            .add_source(env)
            .build()
            .map_err(config_error)?;

        let config: AppConfig = settings.try_deserialize().map_err(config_error)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(AppError::Internal(
                "Configuration error: auth.jwt_secret must be set".into(),
            ));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(AppError::Internal(
                "Configuration error: auth.token_ttl_secs must be positive".into(),
            ));
        }
        if self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(AppError::Internal(format!(
                "Configuration error: auth.token_ttl_secs must not exceed {MAX_TOKEN_TTL_SECS}"
            )));
        }
        Ok(())
    }
}

fn config_error(err: config::ConfigError) -> AppError {
    AppError::Internal(format!("Configuration error: {err}"))
}
