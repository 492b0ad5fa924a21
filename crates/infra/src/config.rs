//! Runtime configuration read from the environment.

use std::time::Duration;

use thiserror::Error;

pub const NOTICE_WORKER_NAME_VAR: &str = "EDUPLAN_NOTICE_WORKER_NAME";
pub const NOTICE_WORKER_TICK_VAR: &str = "EDUPLAN_NOTICE_WORKER_TICK_MS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingConfig {
    /// Thread name of the blocked-notice worker (also used in logs).
    pub notice_worker_name: String,
    /// How often the worker wakes up to check for shutdown.
    pub notice_worker_tick: Duration,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            notice_worker_name: "blocked-notice-worker".to_string(),
            notice_worker_tick: Duration::from_millis(250),
        }
    }
}

impl BillingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(name) = lookup(NOTICE_WORKER_NAME_VAR) {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key: NOTICE_WORKER_NAME_VAR,
                    value: name,
                });
            }
            config.notice_worker_name = name;
        }

        if let Some(raw) = lookup(NOTICE_WORKER_TICK_VAR) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    key: NOTICE_WORKER_TICK_VAR,
                    value: raw.clone(),
                })?;
            config.notice_worker_tick = Duration::from_millis(millis);
        }

        Ok(config)
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn unset_keys_keep_defaults() {
        let config = BillingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, BillingConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = BillingConfig::from_lookup(lookup(&[
            (NOTICE_WORKER_NAME_VAR, "notices"),
            (NOTICE_WORKER_TICK_VAR, "50"),
        ]))
        .unwrap();

        assert_eq!(config.notice_worker_name, "notices");
        assert_eq!(config.notice_worker_tick, Duration::from_millis(50));
    }

    #[test]
    fn zero_or_garbage_tick_is_rejected() {
        for raw in ["0", "soon"] {
            let err = BillingConfig::from_lookup(lookup(&[(NOTICE_WORKER_TICK_VAR, raw)])).unwrap_err();
            assert_eq!(
                err,
                ConfigError::Invalid {
                    key: NOTICE_WORKER_TICK_VAR,
                    value: raw.to_string(),
                }
            );
        }
    }
}
