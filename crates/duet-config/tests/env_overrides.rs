//! `DUET_*` environment variables override every file layer.

use duet_config::{ConfigError, DuetConfig, OracleKind};
use figment::Jail;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn env_beats_project_file() {
    Jail::expect_with(|jail| {
        jail.create_dir(".duet")?;
        jail.create_file(
            ".duet/config.toml",
            r"
[scoring]
approval_threshold = 0.8
",
        )?;
        jail.set_env("DUET_SCORING__APPROVAL_THRESHOLD", "0.9");

        let config = DuetConfig::load().expect("config loads");
        assert!((config.scoring.approval_threshold - 0.9).abs() < f64::EPSILON);
        Ok(())
    });
}

#[test]
fn env_selects_http_oracle() {
    Jail::expect_with(|jail| {
        jail.set_env("DUET_ORACLE__KIND", "http");
        jail.set_env("DUET_ORACLE__ENDPOINT", "http://127.0.0.1:7000");
        jail.set_env("DUET_ORACLE__API_KEY", "tok");

        let config = DuetConfig::load().expect("config loads");
        assert_eq!(config.oracle.kind, OracleKind::Http);
        assert_eq!(config.oracle.endpoint, "http://127.0.0.1:7000");
        assert_eq!(config.oracle.api_key(), Some("tok"));
        Ok(())
    });
}

#[test]
fn http_oracle_without_endpoint_is_not_configured() {
    Jail::expect_with(|jail| {
        jail.set_env("DUET_ORACLE__KIND", "http");

        assert!(matches!(
            DuetConfig::load(),
            Err(ConfigError::NotConfigured { .. })
        ));
        Ok(())
    });
}

#[rstest]
#[case::zero_iterations("DUET_NEGOTIATION__MAX_ITERATIONS", "0", "negotiation.max_iterations")]
#[case::zero_window("DUET_NEGOTIATION__STALL_WINDOW", "0", "negotiation.stall_window")]
#[case::zero_timeout("DUET_NEGOTIATION__ORACLE_TIMEOUT_SECS", "0", "negotiation.oracle_timeout_secs")]
#[case::negative_penalty("DUET_SCORING__MAJOR_PENALTY", "-0.1", "scoring.major_penalty")]
#[case::zero_depth("DUET_BUILDER__MAX_DEPTH", "0", "builder.max_depth")]
#[case::zero_cluster("DUET_VALIDATOR__MIN_CLUSTER_SIZE", "0", "validator.min_cluster_size")]
fn inconsistent_values_are_rejected(
    #[case] var: &str,
    #[case] value: &str,
    #[case] expected_field: &str,
) {
    Jail::expect_with(|jail| {
        jail.set_env(var, value);
        match DuetConfig::load() {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected InvalidValue for {var}, got {other:?}"),
        }
        Ok(())
    });
}
