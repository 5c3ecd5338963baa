use anyhow::{Context, Result};
use serde::Deserialize;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Defaults, optionally replaced by a JSON file named in ONLINE_COURSE_CONFIG,
// then overridden field by field from the environment.
//
// ============================================================================

pub const CONFIG_PATH_VAR: &str = "ONLINE_COURSE_CONFIG";
pub const DEFAULT_CURRENCY_VAR: &str = "ONLINE_COURSE_DEFAULT_CURRENCY";
pub const METRICS_PORT_VAR: &str = "ONLINE_COURSE_METRICS_PORT";
pub const LOG_FILTER_VAR: &str = "ONLINE_COURSE_LOG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Currency given to new courses that don't name one
    pub default_currency: String,
    /// Used when RUST_LOG is not set
    pub log_filter: String,
    /// Serve /metrics and /health on this port when set
    pub metrics_port: Option<u16>,
    pub retry: RetrySettings,
}

/// Backoff applied when a command loses an optimistic-concurrency race
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_currency: "EUR".to_string(),
            log_filter: "info,online_course=debug".to_string(),
            metrics_port: None,
            retry: RetrySettings::default(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 10,
            max_delay_ms: 200,
        }
    }
}

impl AppConfig {
    /// Load from the process environment
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {}", path))?;
                Self::from_json_str(&raw)
                    .with_context(|| format!("Invalid config file {}", path))?
            }
            Err(_) => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Apply overrides from a key lookup (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(currency) = lookup(DEFAULT_CURRENCY_VAR) {
            self.default_currency = currency;
        }
        if let Some(filter) = lookup(LOG_FILTER_VAR) {
            self.log_filter = filter;
        }
        if let Some(port) = lookup(METRICS_PORT_VAR) {
            let port = port
                .parse::<u16>()
                .with_context(|| format!("{} must be a port number, got {:?}", METRICS_PORT_VAR, port))?;
            self.metrics_port = Some(port);
        }
        Ok(())
    }
}
