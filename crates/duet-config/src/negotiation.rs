//! Loop controller configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const fn default_max_iterations() -> u32 {
    5
}

const fn default_stall_threshold() -> f64 {
    0.10
}

const fn default_stall_window() -> u32 {
    2
}

const fn default_oracle_timeout_secs() -> u64 {
    120
}

const fn default_oracle_retries() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NegotiationConfig {
    /// Hard cap on proposer/validator rounds per request.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// A confidence gain below this counts as a stalled iteration.
    #[serde(default = "default_stall_threshold")]
    pub stall_threshold: f64,

    /// Consecutive stalled iterations that end the loop with
    /// `INSUFFICIENT_PROGRESS`.
    #[serde(default = "default_stall_window")]
    pub stall_window: u32,

    /// Per-call oracle timeout, in seconds.
    #[serde(default = "default_oracle_timeout_secs")]
    pub oracle_timeout_secs: u64,

    /// Retries allowed per iteration after a failed oracle call.
    #[serde(default = "default_oracle_retries")]
    pub oracle_retries: u32,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            stall_threshold: default_stall_threshold(),
            stall_window: default_stall_window(),
            oracle_timeout_secs: default_oracle_timeout_secs(),
            oracle_retries: default_oracle_retries(),
        }
    }
}

impl NegotiationConfig {
    #[must_use]
    pub const fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }
}
