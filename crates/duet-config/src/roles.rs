//! Proposer and validator switches.

use serde::{Deserialize, Serialize};

const fn default_true() -> bool {
    true
}

const fn default_min_cluster_size() -> usize {
    2
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProposerConfig {
    /// Repair coverage gaps before handing a hypothesis to the validator.
    #[serde(default = "default_true")]
    pub self_correct: bool,
}

impl Default for ProposerConfig {
    fn default() -> Self {
        Self {
            self_correct: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ValidatorConfig {
    /// Merge the validator oracle's review issues into the report.
    #[serde(default = "default_true")]
    pub oracle_review: bool,

    /// Smallest affinity cluster that counts toward over-collapse.
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            oracle_review: default_true(),
            min_cluster_size: default_min_cluster_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        assert!(ProposerConfig::default().self_correct);
        let validator = ValidatorConfig::default();
        assert!(validator.oracle_review);
        assert_eq!(validator.min_cluster_size, 2);
    }
}
