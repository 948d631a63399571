//! Application configuration loaded from environment variables.

use anyhow::{Context, Result};
use funnel_core::FunnelConfig;
use serde::Deserialize;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Registration backend configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Funnel tunables (cooldown, redirects)
    #[serde(default)]
    pub funnel: FunnelConfig,

    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Registration backend endpoint
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Forward analytics events to the backend
    #[serde(default = "default_true")]
    pub analytics: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Interval between cooldown ticks
    #[serde(default = "default_tick_interval", with = "humantime_serde")]
    pub tick_interval: Duration,

    /// Query string of the page hosting the funnel (job id, campaign, utm_*)
    #[serde(default)]
    pub query: String,

    /// Pending-application marker left by the host session
    #[serde(default)]
    pub session_marker: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout: default_timeout(),
            analytics: default_true(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            query: String::new(),
            session_marker: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_backend_url() -> String {
    "http://localhost:8080".into()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_log_level() -> String {
    "info".into()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Mobile numbers and ids must stay strings.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
