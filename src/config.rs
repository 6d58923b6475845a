use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::rate_limiter::RateLimitConfig;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 10;
const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 60_000;
const DEFAULT_RATE_LIMIT_SWEEP_THRESHOLD: usize = 10_000;
const DEFAULT_RATE_LIMIT_NAMESPACE: &str = "habitara:rl";
const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 10;
const DEFAULT_NOTIFY_FROM: &str = "Habitara <no-reply@habitara.es>";
const DEFAULT_NOTIFY_STAFF_TO: &str = "agencia@habitara.es";

/// Application configuration, loaded once at startup and fixed for the
/// process lifetime.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Redis connection URL (used only when the Redis-backed limiter is on)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Shared secret for validating identity-provider tokens
    #[validate(length(min = 32), custom = "validate_jwt_secret")]
    pub jwt_secret: String,

    /// Expected `iss` claim on inbound tokens
    #[serde(default = "default_jwt_issuer")]
    pub jwt_issuer: String,

    /// Expected `aud` claim on inbound tokens
    #[serde(default = "default_jwt_audience")]
    pub jwt_audience: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment ("development", "staging", "production")
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to bootstrap the schema on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback outside development
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// CORS: allow credentials
    #[serde(default)]
    pub cors_allow_credentials: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Rate limiting: accepted requests per identifier per window
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    /// Rate limiting: window length in milliseconds
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,

    /// Rate limiting: entry-table size that triggers the lazy sweep
    #[serde(default = "default_rate_limit_sweep_threshold")]
    pub rate_limit_sweep_threshold: usize,

    /// Enable the Redis-backed limiter store
    #[serde(default)]
    pub rate_limit_use_redis: bool,

    /// Namespace for limiter keys when Redis is enabled
    #[serde(default = "default_rate_limit_namespace")]
    pub rate_limit_namespace: String,

    /// Sender address for transactional mail
    #[serde(default = "default_notify_from")]
    pub notify_from: String,

    /// Staff inbox receiving submission notifications
    #[serde(default = "default_notify_staff_to")]
    pub notify_staff_to: String,

    /// Transactional-mail HTTP API endpoint; mail is disabled when unset
    #[serde(default)]
    pub mail_api_url: Option<String>,

    /// Bearer token for the mail provider
    #[serde(default)]
    pub mail_api_token: Option<String>,

    /// Timeout for mail provider calls (seconds)
    #[serde(default = "default_mail_timeout_secs")]
    pub mail_timeout_secs: u64,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}
fn default_jwt_issuer() -> String {
    "habitara-auth".to_string()
}
fn default_jwt_audience() -> String {
    "habitara-api".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}
fn default_rate_limit_max_requests() -> u32 {
    DEFAULT_RATE_LIMIT_MAX_REQUESTS
}
fn default_rate_limit_window_ms() -> u64 {
    DEFAULT_RATE_LIMIT_WINDOW_MS
}
fn default_rate_limit_sweep_threshold() -> usize {
    DEFAULT_RATE_LIMIT_SWEEP_THRESHOLD
}
fn default_rate_limit_namespace() -> String {
    DEFAULT_RATE_LIMIT_NAMESPACE.to_string()
}
fn default_notify_from() -> String {
    DEFAULT_NOTIFY_FROM.to_string()
}
fn default_notify_staff_to() -> String {
    DEFAULT_NOTIFY_STAFF_TO.to_string()
}
fn default_mail_timeout_secs() -> u64 {
    DEFAULT_MAIL_TIMEOUT_SECS
}

fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    if secret.trim() != secret || secret.contains("changeme") {
        return Err(ValidationError::new("jwt_secret_placeholder"));
    }
    Ok(())
}

impl AppConfig {
    /// Construct a configuration directly, primarily for tests.
    pub fn new(
        database_url: String,
        redis_url: String,
        jwt_secret: String,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            redis_url,
            jwt_secret,
            jwt_issuer: default_jwt_issuer(),
            jwt_audience: default_jwt_audience(),
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            rate_limit_sweep_threshold: default_rate_limit_sweep_threshold(),
            rate_limit_use_redis: false,
            rate_limit_namespace: default_rate_limit_namespace(),
            notify_from: default_notify_from(),
            notify_staff_to: default_notify_staff_to(),
            mail_api_url: None,
            mail_api_token: None,
            mail_timeout_secs: default_mail_timeout_secs(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.rate_limit_max_requests,
            window: Duration::from_millis(self.rate_limit_window_ms),
            sweep_threshold: self.rate_limit_sweep_threshold,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Load configuration from `config/{default,<env>}.toml` layered with
/// `APP__*` environment variables, then validate it.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let environment =
        std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let cfg: AppConfig = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, environment)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?
        .try_deserialize()?;

    cfg.validate()?;

    info!(
        environment = %cfg.environment,
        port = cfg.port,
        rate_limit_max_requests = cfg.rate_limit_max_requests,
        rate_limit_window_ms = cfg.rate_limit_window_ms,
        "configuration loaded"
    );

    Ok(cfg)
}

/// Initialize the global tracing subscriber. Call once, before anything logs.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},sqlx=warn,hyper=warn", level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}
