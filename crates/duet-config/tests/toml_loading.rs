//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var and file manipulation.

use duet_config::{ConfigError, DuetConfig, OracleKind};
use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;

#[test]
fn loads_every_section_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[builder]
max_depth = 512

[negotiation]
max_iterations = 8
stall_threshold = 0.05
stall_window = 3
oracle_timeout_secs = 30
oracle_retries = 2

[scoring]
major_penalty = 0.2
approval_threshold = 0.9

[proposer]
self_correct = false

[validator]
oracle_review = false
min_cluster_size = 3

[oracle]
kind = "http"
endpoint = "http://localhost:9000"
api_key = "secret"
"#,
        )?;

        let figment = Figment::from(Serialized::defaults(DuetConfig::default()))
            .merge(Toml::file("config.toml"));
        let config = DuetConfig::from_figment(&figment).expect("config is valid");

        assert_eq!(config.builder.max_depth, 512);
        assert_eq!(config.negotiation.max_iterations, 8);
        assert_eq!(config.negotiation.stall_window, 3);
        assert_eq!(config.negotiation.oracle_timeout_secs, 30);
        assert_eq!(config.negotiation.oracle_retries, 2);
        assert!((config.scoring.major_penalty - 0.2).abs() < f64::EPSILON);
        assert!((config.scoring.approval_threshold - 0.9).abs() < f64::EPSILON);
        // Unset keys keep their defaults.
        assert!((config.scoring.minor_penalty - 0.05).abs() < f64::EPSILON);
        assert!(!config.proposer.self_correct);
        assert!(!config.validator.oracle_review);
        assert_eq!(config.validator.min_cluster_size, 3);
        assert_eq!(config.oracle.kind, OracleKind::Http);
        assert_eq!(config.oracle.api_key(), Some("secret"));
        Ok(())
    });
}

#[test]
fn project_local_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".duet")?;
        jail.create_file(
            ".duet/config.toml",
            r"
[negotiation]
max_iterations = 3
",
        )?;

        let config = DuetConfig::load().expect("config loads");
        assert_eq!(config.negotiation.max_iterations, 3);
        Ok(())
    });
}

#[cfg(target_os = "linux")]
#[test]
fn project_local_file_beats_user_global() {
    Jail::expect_with(|jail| {
        let xdg = jail.directory().join("xdg");
        jail.create_dir("xdg/duet")?;
        jail.create_file(
            "xdg/duet/config.toml",
            r"
[negotiation]
max_iterations = 7
stall_window = 4
",
        )?;
        jail.set_env("XDG_CONFIG_HOME", xdg.display());

        jail.create_dir(".duet")?;
        jail.create_file(
            ".duet/config.toml",
            r"
[negotiation]
max_iterations = 3
",
        )?;

        let config = DuetConfig::load().expect("config loads");
        assert_eq!(config.negotiation.max_iterations, 3);
        assert_eq!(config.negotiation.stall_window, 4);
        Ok(())
    });
}

#[test]
fn out_of_range_weight_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_dir(".duet")?;
        jail.create_file(
            ".duet/config.toml",
            r"
[scoring]
coverage_ceiling = 1.5
",
        )?;

        match DuetConfig::load() {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "scoring.coverage_ceiling");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
        Ok(())
    });
}

#[test]
fn malformed_toml_is_a_figment_error() {
    Jail::expect_with(|jail| {
        jail.create_dir(".duet")?;
        jail.create_file(".duet/config.toml", "[negotiation\nmax_iterations = ")?;

        assert!(matches!(DuetConfig::load(), Err(ConfigError::Figment(_))));
        Ok(())
    });
}
