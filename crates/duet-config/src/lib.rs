//! # duet-config
//!
//! Layered configuration loading for duet using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`DUET_*` prefix, `__` as separator)
//! 2. Project-level `.duet/config.toml`
//! 3. User-level `~/.config/duet/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `DUET_SCORING__APPROVAL_THRESHOLD` -> `scoring.approval_threshold`,
//! `DUET_ORACLE__KIND` -> `oracle.kind`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use duet_config::DuetConfig;
//!
//! // Load from all sources (dotenvy + TOML + env), then validate:
//! let config = DuetConfig::load_with_dotenv().expect("config");
//!
//! println!("max iterations: {}", config.negotiation.max_iterations);
//! ```

mod builder;
mod error;
mod negotiation;
mod oracle;
mod roles;
mod scoring;

pub use builder::BuilderConfig;
pub use error::ConfigError;
pub use negotiation::NegotiationConfig;
pub use oracle::{OracleConfig, OracleKind};
pub use roles::{ProposerConfig, ValidatorConfig};
pub use scoring::ScoringConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix for every override.
pub const ENV_PREFIX: &str = "DUET_";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DuetConfig {
    #[serde(default)]
    pub builder: BuilderConfig,

    #[serde(default)]
    pub negotiation: NegotiationConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub proposer: ProposerConfig,

    #[serde(default)]
    pub validator: ValidatorConfig,

    #[serde(default)]
    pub oracle: OracleConfig,
}

impl DuetConfig {
    /// Load and validate configuration from all sources (TOML files +
    /// environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] when a source fails to parse or merge,
    /// and the errors of [`Self::validate`] otherwise.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration with `.env` file support.
    ///
    /// Calls `dotenvy` to load the `.env` file from the workspace root before
    /// building the figment. This is the typical entry point for the CLI.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Extract and validate a config from an arbitrary provider chain.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".duet/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Reject values the loop cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending key,
    /// or [`ConfigError::NotConfigured`] when the HTTP oracle has no endpoint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.builder.max_depth == 0 {
            return Err(ConfigError::invalid("builder.max_depth", "must be at least 1"));
        }

        let negotiation = &self.negotiation;
        if negotiation.max_iterations == 0 {
            return Err(ConfigError::invalid(
                "negotiation.max_iterations",
                "must be at least 1",
            ));
        }
        if negotiation.stall_window == 0 {
            return Err(ConfigError::invalid(
                "negotiation.stall_window",
                "must be at least 1",
            ));
        }
        if negotiation.oracle_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "negotiation.oracle_timeout_secs",
                "must be at least 1 second",
            ));
        }
        check_unit_interval("negotiation.stall_threshold", negotiation.stall_threshold)?;

        for (field, value) in self.scoring.weights() {
            check_unit_interval(field, value)?;
        }

        if self.validator.min_cluster_size == 0 {
            return Err(ConfigError::invalid(
                "validator.min_cluster_size",
                "must be at least 1",
            ));
        }

        if self.oracle.kind == OracleKind::Http && !self.oracle.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "oracle".to_string(),
            });
        }

        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("duet").join("config.toml"))
    }

    /// Load `.env` from the workspace root.
    ///
    /// Walks up from `CARGO_MANIFEST_DIR` (if available) or current dir looking
    /// for a `.env` file. Silently does nothing if no `.env` is found.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

fn check_unit_interval(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("{value} is outside [0, 1]"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DuetConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.oracle.kind, OracleKind::Local);
        assert!(config.proposer.self_correct);
    }

    #[test]
    fn figment_builds_without_files() {
        let config: DuetConfig = DuetConfig::figment()
            .extract()
            .expect("should extract defaults");
        assert_eq!(config.negotiation.max_iterations, 5);
        assert_eq!(config.builder.max_depth, 4096);
    }

    #[test]
    fn http_oracle_requires_endpoint() {
        let mut config = DuetConfig::default();
        config.oracle.kind = OracleKind::Http;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotConfigured { section }) if section == "oracle"
        ));

        config.oracle.endpoint = "http://localhost:8080".into();
        assert!(config.validate().is_ok());
    }
}
