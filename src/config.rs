use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::utils::RetryConfig;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Defaults can be overridden from the environment:
// - ORDER_ADJUSTMENTS_LOG                      tracing filter directives
// - ORDER_ADJUSTMENTS_RETRY_ATTEMPTS           attempts per request
// - ORDER_ADJUSTMENTS_RETRY_INITIAL_DELAY_MS   first backoff delay
//
// RUST_LOG still wins over ORDER_ADJUSTMENTS_LOG when set.
//
// ============================================================================

pub const LOG_ENV: &str = "ORDER_ADJUSTMENTS_LOG";
pub const RETRY_ATTEMPTS_ENV: &str = "ORDER_ADJUSTMENTS_RETRY_ATTEMPTS";
pub const RETRY_DELAY_ENV: &str = "ORDER_ADJUSTMENTS_RETRY_INITIAL_DELAY_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default tracing filter directives
    pub log_filter: String,
    pub retry_attempts: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: "info,order_adjustments=debug".to_string(),
            retry_attempts: 3,
            retry_initial_delay_ms: 20,
            retry_max_delay_ms: 1_000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(filter) = lookup(LOG_ENV) {
            config.log_filter = filter;
        }

        if let Some(attempts) = lookup(RETRY_ATTEMPTS_ENV) {
            config.retry_attempts = attempts
                .trim()
                .parse()
                .with_context(|| format!("{} must be a positive integer, got {:?}", RETRY_ATTEMPTS_ENV, attempts))?;
            if config.retry_attempts == 0 {
                anyhow::bail!("{} must be at least 1", RETRY_ATTEMPTS_ENV);
            }
        }

        if let Some(delay) = lookup(RETRY_DELAY_ENV) {
            config.retry_initial_delay_ms = delay
                .trim()
                .parse()
                .with_context(|| format!("{} must be milliseconds, got {:?}", RETRY_DELAY_ENV, delay))?;
        }

        Ok(config)
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry_attempts,
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            ..RetryConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.retry().max_attempts, 3);
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = AppConfig::from_lookup(lookup(&[
            (LOG_ENV, "warn"),
            (RETRY_ATTEMPTS_ENV, " 5 "),
            (RETRY_DELAY_ENV, "250"),
        ]))
        .unwrap();

        assert_eq!(config.log_filter, "warn");
        let retry = config.retry();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.initial_delay, Duration::from_millis(250));
        assert_eq!(retry.max_delay, Duration::from_millis(1_000));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[(RETRY_ATTEMPTS_ENV, "many")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[(RETRY_ATTEMPTS_ENV, "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[(RETRY_DELAY_ENV, "-1")])).is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"retry_attempts": 7}"#).unwrap();

        assert_eq!(config.retry_attempts, 7);
        assert_eq!(config.log_filter, AppConfig::default().log_filter);
    }
}
