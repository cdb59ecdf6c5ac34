//! Realtime presence configuration

use std::time::Duration;

use crate::{parse_env, parse_optional_env, ConfigError, ConfigResult};

/// Default interval between typing expiry sweeps
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5;

/// Tuning for the presence and typing layer
///
/// Typing indicators only clear on an explicit stop signal or a disconnect
/// unless `typing_idle_timeout` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeConfig {
    /// Maximum age of a typing indicator before the sweeper clears it
    pub typing_idle_timeout: Option<Duration>,

    /// How often the sweeper runs when an idle timeout is configured
    pub typing_sweep_interval: Duration,
}

impl RealtimeConfig {
    /// Load realtime configuration from environment variables
    ///
    /// - `TYPING_IDLE_TIMEOUT_SECS`: unset or empty disables expiry
    /// - `TYPING_SWEEP_INTERVAL_SECS`: defaults to 5
    pub fn from_env() -> ConfigResult<Self> {
        let idle_secs: Option<u64> = parse_optional_env("TYPING_IDLE_TIMEOUT_SECS")?;
        let sweep_secs: u64 = parse_env("TYPING_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?;

        Self::new(idle_secs.map(Duration::from_secs), Duration::from_secs(sweep_secs))
    }

    /// Build a validated configuration
    pub fn new(
        typing_idle_timeout: Option<Duration>,
        typing_sweep_interval: Duration,
    ) -> ConfigResult<Self> {
        if typing_idle_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(ConfigError::ValidationError(
                "TYPING_IDLE_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        if typing_sweep_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "TYPING_SWEEP_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            typing_idle_timeout,
            typing_sweep_interval,
        })
    }

    /// Whether the typing sweeper should be started
    pub fn typing_expiry_enabled(&self) -> bool {
        self.typing_idle_timeout.is_some()
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            typing_idle_timeout: None,
            typing_sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}
