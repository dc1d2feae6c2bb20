use crate::endpoint::RetryPolicy;
use serde_derive::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BEACON_NODE: &str = "http://localhost:5052/";

/// Cool-down applied after the first failure of an endpoint, in seconds.
pub const DEFAULT_INITIAL_RETRY_COOLDOWN_SECS: u64 = 5;

/// Upper bound on the per-endpoint cool-down, in seconds.
pub const DEFAULT_MAX_RETRY_COOLDOWN_SECS: u64 = 300;

pub const DEFAULT_REQUEST_TIMEOUT_MILLIS: u64 = 12_000;

/// Stores the runtime configuration for the beacon node proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The http endpoints of the remote beacon nodes, highest priority first.
    ///
    /// Should be similar to `["http://localhost:5052"]`.
    pub beacon_nodes: Vec<String>,
    /// Seconds to wait before re-trying an endpoint after its first failure.
    /// Doubles with each consecutive failure.
    pub initial_retry_cooldown_secs: u64,
    /// Ceiling for the per-endpoint retry cool-down, in seconds.
    pub max_retry_cooldown_secs: u64,
    /// Timeout applied to each remote request, in milliseconds.
    pub request_timeout_millis: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            beacon_nodes: vec![DEFAULT_BEACON_NODE.to_string()],
            initial_retry_cooldown_secs: DEFAULT_INITIAL_RETRY_COOLDOWN_SECS,
            max_retry_cooldown_secs: DEFAULT_MAX_RETRY_COOLDOWN_SECS,
            request_timeout_millis: DEFAULT_REQUEST_TIMEOUT_MILLIS,
        }
    }
}

impl Config {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_secs(self.initial_retry_cooldown_secs),
            Duration::from_secs(self.max_retry_cooldown_secs),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_millis)
    }
}
