//! Entity graph builder configuration.

use serde::{Deserialize, Serialize};

/// Default bound on entity nesting depth.
const fn default_max_depth() -> u32 {
    4096
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BuilderConfig {
    /// Deepest entity nesting the walk accepts before failing with
    /// `NestingTooDeep`. A safety bound only; nothing below it is collapsed.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}
