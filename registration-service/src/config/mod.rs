use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Assembled from the common `APP__*` settings plus the bare environment
/// variables the deployment already uses.
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: Secret<String>,
    pub database: String,
    pub collection: String,
    /// Upper bound for retrying the initial connection. Zero means a single attempt.
    pub connect_retry_window: Duration,
}

impl RegistrationConfig {
    pub fn load() -> Result<Self, AppError> {
        let mut common = core_config::Config::load()?;

        // The deployment convention is a bare PORT variable; it wins over APP__PORT.
        if let Ok(port) = env::var("PORT") {
            common.port = parse_env("PORT", &port)?;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            common.log_level = level;
        }
        if let Ok(endpoint) = env::var("OTLP_ENDPOINT") {
            common.otlp_endpoint = Some(endpoint).filter(|e| !e.is_empty());
        }

        let retry_secs: u64 = parse_env(
            "MONGODB_CONNECT_RETRY_SECS",
            &get_env("MONGODB_CONNECT_RETRY_SECS", "0"),
        )?;

        Ok(RegistrationConfig {
            common,
            mongodb: MongoConfig {
                uri: Secret::new(get_env("MONGO_URI", "mongodb://localhost:27017")),
                database: get_env("MONGODB_DATABASE", "dot_database"),
                collection: get_env("MONGODB_COLLECTION", "registrations"),
                connect_retry_window: Duration::from_secs(retry_secs),
            },
            static_dir: PathBuf::from(get_env("STATIC_DIR", "registration-service/static")),
        })
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e))
    })
}
