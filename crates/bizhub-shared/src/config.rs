//! Configuration management

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub logging: LoggingSettings,
    pub activity_log: ActivityLogSettings,
    pub scheduler: SchedulerSettings,
    pub rate_limit: RateLimitSettings,
    pub bootstrap: BootstrapSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    /// Access token lifetime in seconds
    pub access_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub level: String,
    /// `json` or `pretty`
    pub format: String,
    /// Directory for daily rolling log files, empty to disable
    pub directory: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ActivityLogSettings {
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub batch_timeout_ms: u64,
    pub worker_count: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerSettings {
    /// 0 disables the expiry sweep
    pub expiry_check_interval_seconds: u64,
    pub expiring_soon_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitSettings {
    pub login_attempts_per_minute: u32,
}

/// First administrator, created at startup when no user has this email
#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapSettings {
    pub admin_name: String,
    /// Empty disables bootstrapping
    pub admin_email: String,
    pub admin_password: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::default().separator("__").try_parsing(true))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "bizhub-server")?
            .set_default("app.request_timeout_seconds", 30)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.acquire_timeout_seconds", 3)?
            .set_default("database.run_migrations", true)?
            .set_default("jwt.access_token_expiry", crate::constants::DEFAULT_ACCESS_TOKEN_EXPIRY)?
            .set_default("logging.level", "info,bizhub=debug")?
            .set_default("logging.format", "json")?
            .set_default("logging.directory", "")?
            .set_default("activity_log.queue_capacity", 10_000)?
            .set_default("activity_log.batch_size", 100)?
            .set_default("activity_log.batch_timeout_ms", 1000)?
            .set_default("activity_log.worker_count", 2)?
            .set_default("scheduler.expiry_check_interval_seconds", 3600)?
            .set_default("scheduler.expiring_soon_days", crate::constants::DEFAULT_EXPIRING_SOON_DAYS)?
            .set_default("rate_limit.login_attempts_per_minute", 10)?
            .set_default("bootstrap.admin_name", "Administrator")?
            .set_default("bootstrap.admin_email", "")?
            .set_default("bootstrap.admin_password", "")
    }
}
