//! # Sync Configuration
//!
//! Configuration for the sync loop and action dispatcher.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{DEFAULT_MAX_NAME_LEN, DEFAULT_SYNC_INTERVAL_MS};

/// Sync and dispatch configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Periodic sync interval in milliseconds.
    pub sync_interval_ms: u64,

    /// Run one sync as soon as the loop (re)starts instead of waiting a
    /// full interval.
    pub sync_on_start: bool,

    /// Upper bound on record names accepted by `create`, in bytes.
    pub max_name_len: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
            sync_on_start: true,
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }
}

impl SyncConfig {
    /// Create a config for testing (short interval).
    pub fn for_testing() -> Self {
        Self {
            sync_interval_ms: 50,
            sync_on_start: true,
            max_name_len: 64,
        }
    }

    /// Periodic sync interval. Never zero.
    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.sync_interval(), Duration::from_millis(2000));
        assert!(config.sync_on_start);
        assert_eq!(config.max_name_len, 256);
    }

    #[test]
    fn test_testing_config() {
        let config = SyncConfig::for_testing();
        assert_eq!(config.sync_interval_ms, 50);
    }

    #[test]
    fn test_zero_interval_clamped() {
        let config = SyncConfig {
            sync_interval_ms: 0,
            ..SyncConfig::default()
        };
        assert_eq!(config.sync_interval(), Duration::from_millis(1));
    }
}
