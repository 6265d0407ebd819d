use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::info;

const CONFIG_DIR: &str = "config";
const DEFAULT_ENV: &str = "development";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Application configuration, layered from config files and `APP__*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub jwt_expiration: i64,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: Option<String>,
    #[serde(default)]
    pub log_json: bool,
    #[serde(default = "default_true")]
    pub auto_migrate: bool,
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub db_min_connections: u32,
    /// Comma-separated list of allowed CORS origins; unset means permissive
    /// CORS in development and a hard error in production.
    pub cors_allowed_origins: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    1
}
fn default_request_timeout() -> u64 {
    30
}

impl AppConfig {
    /// Direct constructor, used by tests and tools that bypass file loading.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        database_url: String,
        jwt_secret: String,
        jwt_expiration: i64,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            host,
            port,
            environment,
            log_level: None,
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_max_connections(),
            db_min_connections: default_min_connections(),
            cors_allowed_origins: None,
            request_timeout_secs: default_request_timeout(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        !self.is_production()
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level when set; `json` switches the
/// fmt layer to structured JSON output.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("cantina_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration.
///
/// Sources are layered in this order:
/// 1. `config/default.toml`
/// 2. `config/{RUN_ENV}.toml`
/// 3. environment variables (`APP__*`)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // jwt_secret has no default on purpose: it must come from a config file
    // or APP__JWT_SECRET.
    let config = Config::builder()
        .set_default("database_url", "sqlite://cantina.db?mode=rwc")?
        .set_default("jwt_expiration", 3600)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8080)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("jwt_secret").is_err() {
        return Err(AppConfigError::Invalid(
            "jwt_secret is required but not configured; set APP__JWT_SECRET".into(),
        ));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    if app_config.jwt_secret.len() < 32 {
        return Err(AppConfigError::Invalid(
            "jwt_secret must be at least 32 characters".into(),
        ));
    }
    if app_config.is_production() && app_config.cors_allowed_origins.is_none() {
        return Err(AppConfigError::Invalid(
            "cors_allowed_origins must be set in production".into(),
        ));
    }

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only".to_string(),
            3600,
            "127.0.0.1".to_string(),
            8080,
            "test".to_string(),
        )
    }

    #[test]
    fn non_production_environments_count_as_development() {
        let mut cfg = base_config();
        assert!(cfg.is_development());
        cfg.environment = "production".into();
        assert!(cfg.is_production());
        assert!(!cfg.is_development());
    }

    #[test]
    fn log_level_falls_back_to_default() {
        let mut cfg = base_config();
        assert_eq!(cfg.log_level(), "info");
        cfg.log_level = Some("debug".into());
        assert_eq!(cfg.log_level(), "debug");
    }
}
