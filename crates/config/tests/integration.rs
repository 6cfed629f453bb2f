//! Integration tests for config

#[cfg(test)]
mod tests {
    use banker_config::*;
    use banker_errors::{ConfigError, Error};
    use banker_types::{ColorChoice, DemandPolicy, OutputFormat};
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 5] = [
        "BANKER_OUTPUT",
        "BANKER_COLOR",
        "BANKER_DURATION",
        "BANKER_SEED",
        "BANKER_MAX_REQUEST",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
default_output = "plain"
color = "never"

[ledger]
policy = "per_requester"
total = [10, 5, 7]
maximum = [[7, 5, 3], [3, 2, 2]]

[simulation]
duration_secs = 5
hold_min_ms = 10
hold_max_ms = 20

[backoff]
initial_delay_ms = 50
jitter_factor = 0.0
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.default_output, OutputFormat::Plain);
        assert_eq!(config.general.color, ColorChoice::Never);
        assert_eq!(config.ledger.policy, DemandPolicy::PerRequester);
        assert_eq!(config.ledger.maximum, vec![vec![7, 5, 3], vec![3, 2, 2]]);
        assert_eq!(config.simulation.duration_secs, 5);
        assert_eq!(config.simulation.hold_range_ms(), 10..=20);
        assert_eq!(config.simulation.pause_max_ms, 3000);
        assert_eq!(config.backoff.initial_delay_ms, 50);
        assert!((config.backoff.multiplier - 2.0).abs() < f64::EPSILON);
        config.validate().unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from_file(&dir.path().join("absent.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_invalid_toml_is_parse_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[ledger]\ntotal = \"ten\"").unwrap();

        let err = Config::load_from_file(temp_file.path()).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError { .. })));
    }

    #[tokio::test]
    async fn test_load_or_default_prefers_explicit_path() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[simulation]\nseed = 42").unwrap();

        let config = Config::load_or_default(Some(temp_file.path())).await.unwrap();
        assert_eq!(config.simulation.seed, Some(42));
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("BANKER_OUTPUT", "json");
        std::env::set_var("BANKER_COLOR", "always");
        std::env::set_var("BANKER_DURATION", "12");
        std::env::set_var("BANKER_SEED", "99");
        std::env::set_var("BANKER_MAX_REQUEST", "3");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.general.default_output, OutputFormat::Json);
        assert_eq!(config.general.color, ColorChoice::Always);
        assert_eq!(config.simulation.duration_secs, 12);
        assert_eq!(config.simulation.seed, Some(99));
        assert_eq!(config.simulation.max_request_per_type, 3);

        clear_env();
    }

    #[test]
    fn test_merge_env_rejects_bad_values() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("BANKER_SEED", "not-a-number");
        let mut config = Config::default();
        let err = config.merge_env().unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { ref field, .. }) if field == "BANKER_SEED"
        ));

        clear_env();
        std::env::set_var("BANKER_OUTPUT", "xml");
        assert!(Config::default().merge_env().is_err());

        clear_env();
    }
}
