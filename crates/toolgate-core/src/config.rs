//! Environment-provided configuration, read once at startup.
//!
//! Adapters receive explicit config structs built from an [`EnvSource`];
//! nothing consults ambient environment state after startup.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable '{0}' is not set")]
    Missing(String),

    #[error("environment variable '{var}' is invalid: {reason}")]
    Invalid { var: String, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Source of configuration values. The process environment in production,
/// a map in tests.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads from `std::env`
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for std::collections::HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        std::collections::HashMap::get(self, key).cloned()
    }
}

/// Fetch a required variable, failing startup with the variable's name
pub fn require(env: &dyn EnvSource, key: &str) -> ConfigResult<String> {
    match env.get(key) {
        Some(value) if !value.is_empty() => Ok(value),
        Some(_) => Err(ConfigError::Invalid { var: key.to_string(), reason: "value is empty".into() }),
        None => Err(ConfigError::Missing(key.to_string())),
    }
}

pub fn optional(env: &dyn EnvSource, key: &str) -> Option<String> {
    env.get(key).filter(|v| !v.is_empty())
}

pub fn optional_parse<T: std::str::FromStr>(env: &dyn EnvSource, key: &str) -> ConfigResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match optional(env, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid { var: key.to_string(), reason: e.to_string() }),
    }
}

/// Gateway-wide execution limits applied by the dispatcher
#[derive(Debug, Clone)]
pub struct Limits {
    pub max_concurrency: usize,
    pub call_timeout: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_concurrency: 10, call_timeout: Duration::from_secs(30) }
    }
}

impl Limits {
    pub fn new(max_concurrency: usize, call_timeout: Duration) -> Self {
        Self { max_concurrency: max_concurrency.max(1), call_timeout }
    }
}
