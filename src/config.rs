//! Timing configuration for the panel registry.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DRIFT_INTERVAL_ENV: &str = "FLOATDESK_DRIFT_INTERVAL_MS";
const ACTIVATION_DELAY_ENV: &str = "FLOATDESK_ACTIVATION_DELAY_MS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Period of the pass that re-reads live widget state.
    #[serde(rename = "drift_interval_ms", with = "millis")]
    pub drift_interval: Duration,
    /// Delay before a freshly registered panel is focused a second time.
    /// Widgets finish their own layout after construction.
    #[serde(rename = "activation_delay_ms", with = "millis")]
    pub activation_delay: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            drift_interval: Duration::from_millis(100),
            activation_delay: Duration::from_millis(50),
        }
    }
}

impl RegistryConfig {
    /// Defaults, overridden by `FLOATDESK_*` environment variables when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(DRIFT_INTERVAL_ENV) {
            config.drift_interval = parse_millis(DRIFT_INTERVAL_ENV, &raw)?;
        }
        if let Some(raw) = lookup(ACTIVATION_DELAY_ENV) {
            config.activation_delay = parse_millis(ACTIVATION_DELAY_ENV, &raw)?;
        }

        Ok(config)
    }
}

fn parse_millis(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
