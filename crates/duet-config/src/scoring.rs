//! Validator scoring weights.
//!
//! Confidence is `1.0 - majors * major_penalty - minors * minor_penalty`
//! minus the verification and regression penalties when they apply,
//! clamped to `[0, 1]` and further to `coverage_ceiling` while coverage is
//! incomplete.

use serde::{Deserialize, Serialize};

const fn default_major_penalty() -> f64 {
    0.15
}

const fn default_minor_penalty() -> f64 {
    0.05
}

const fn default_verification_penalty() -> f64 {
    0.15
}

const fn default_regression_penalty() -> f64 {
    0.10
}

const fn default_coverage_ceiling() -> f64 {
    0.40
}

const fn default_approval_threshold() -> f64 {
    0.85
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScoringConfig {
    #[serde(default = "default_major_penalty")]
    pub major_penalty: f64,

    #[serde(default = "default_minor_penalty")]
    pub minor_penalty: f64,

    /// Subtracted once when any feedback claim fails verification.
    #[serde(default = "default_verification_penalty")]
    pub verification_penalty: f64,

    /// Subtracted when the major issue count did not strictly decrease.
    #[serde(default = "default_regression_penalty")]
    pub regression_penalty: f64,

    /// Upper bound on confidence while coverage is incomplete.
    #[serde(default = "default_coverage_ceiling")]
    pub coverage_ceiling: f64,

    /// Minimum confidence for approval.
    #[serde(default = "default_approval_threshold")]
    pub approval_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            major_penalty: default_major_penalty(),
            minor_penalty: default_minor_penalty(),
            verification_penalty: default_verification_penalty(),
            regression_penalty: default_regression_penalty(),
            coverage_ceiling: default_coverage_ceiling(),
            approval_threshold: default_approval_threshold(),
        }
    }
}

impl ScoringConfig {
    /// Every weight with its dotted config key, for validation.
    pub(crate) fn weights(&self) -> [(&'static str, f64); 6] {
        [
            ("scoring.major_penalty", self.major_penalty),
            ("scoring.minor_penalty", self.minor_penalty),
            ("scoring.verification_penalty", self.verification_penalty),
            ("scoring.regression_penalty", self.regression_penalty),
            ("scoring.coverage_ceiling", self.coverage_ceiling),
            ("scoring.approval_threshold", self.approval_threshold),
        ]
    }
}
