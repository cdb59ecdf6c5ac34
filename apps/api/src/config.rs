//! API server configuration

use std::env;

use anyhow::{Context, Result};
use parley_shared_config::{CommonConfig, Environment, RealtimeConfig, DEFAULT_LOG_FILTER};

/// Default listen port
const DEFAULT_PORT: u16 = 8080;

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with other services
    pub common: CommonConfig,

    /// Server port (default: 8080)
    pub port: u16,

    /// CORS allowed origins (optional)
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            common: CommonConfig {
                realtime: RealtimeConfig::default(),
                environment: Environment::Development,
                log_level: DEFAULT_LOG_FILTER.to_string(),
            },
            port: DEFAULT_PORT,
            cors_allowed_origins: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// - `PORT`: listen port, default 8080
    /// - `CORS_ORIGINS`: comma-separated origins; empty entries are skipped
    /// - everything `CommonConfig::from_env` reads
    pub fn from_env() -> Result<Self> {
        let common = CommonConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        Ok(Self {
            common,

            port: match env::var("PORT") {
                Ok(port) => port.trim().parse().context("Invalid PORT value")?,
                Err(_) => DEFAULT_PORT,
            },

            cors_allowed_origins: Self::parse_origins(env::var("CORS_ORIGINS").ok()),
        })
    }

    fn parse_origins(raw: Option<String>) -> Option<Vec<String>> {
        raw.map(|s| {
            s.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }

    /// Directives for the tracing `EnvFilter`
    pub fn log_filter(&self) -> &str {
        &self.common.log_level
    }

    pub fn realtime(&self) -> &RealtimeConfig {
        &self.common.realtime
    }

    pub fn environment(&self) -> Environment {
        self.common.environment
    }

    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}
