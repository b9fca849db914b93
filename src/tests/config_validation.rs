#[cfg(test)]
mod tests {

    use std::io::Write;

    use serial_test::serial;

    use crate::config::proc_loader::{expand_env_vars, file_to_config, parse_config};
    use crate::config::proc_validator::validate_service_config;
    use crate::config::settings::LogFormat;
    use crate::config::types::ServiceConfig;
    use crate::utils::logging::{resolve, LogLevel};

    #[tokio::test]
    async fn empty_config_gets_defaults() {
        let cfg: ServiceConfig = parse_config("{}".to_string()).await.expect("defaults are valid");

        assert_eq!(cfg.cell.name, "default");
        assert_eq!(cfg.cell.safety_margin_ms, 10);
        assert_eq!(cfg.cell.min_refresh_interval_ms, 10);
        assert_eq!(cfg.authorizer.life_span_ms, 100);
        assert_eq!(cfg.authorizer.outage_ms, 200);
        assert_eq!(cfg.settings.metrics.path, "/metrics");
        assert!(!cfg.settings.metrics.is_enabled);
        let logging = cfg.settings.logging.expect("logging default applied");
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, LogFormat::Compact);
    }

    #[tokio::test]
    async fn full_config_is_parsed() {
        let yaml = r#"
settings:
  server:
    host: 0.0.0.0
    port: "9200"
  metrics:
    path: "/metrics"
    is_enabled: true
  logging:
    level: debug
    format: json
  retry:
    attempts: 5
    base_delay_ms: 50
    max_delay_ms: 400
cell:
  name: billing-api
  safety_margin_ms: 500
  safety_margin_percent: 10
  min_refresh_interval_ms: 100
authorizer:
  life_span_ms: 5000
  failure_rate: 0.1
  outage_ms: 1000
  latency_ms: 20
"#;
        let cfg = parse_config(yaml.to_string()).await.expect("valid config");
        assert_eq!(cfg.cell.name, "billing-api");
        assert_eq!(cfg.cell.safety_margin_percent, Some(10));
        assert_eq!(cfg.settings.retry.as_ref().and_then(|r| r.attempts), Some(5));
        assert_eq!(cfg.settings.server.port, "9200");
        assert_eq!(cfg.authorizer.latency_ms, 20);
    }

    #[tokio::test]
    async fn invalid_config_reports_all_errors() {
        let yaml = r#"
settings:
  server:
    host: ""
    port: "not-a-port"
  metrics:
    path: "metrics"
  retry:
    attempts: 0
    base_delay_ms: 500
    max_delay_ms: 100
cell:
  safety_margin_percent: 150
  min_refresh_interval_ms: 0
authorizer:
  failure_rate: 1.5
"#;
        let cfg: ServiceConfig = serde_yaml::from_str(yaml).expect("well-formed yaml");
        let errs = validate_service_config(&cfg).await.expect_err("config must be rejected");

        for expected in [
            "settings.server.host",
            "settings.server.port",
            "settings.metrics.path",
            "attempts must be >= 1",
            "max_delay_ms",
            "safety_margin_percent",
            "min_refresh_interval_ms",
            "failure_rate",
        ] {
            assert!(
                errs.iter().any(|e| e.contains(expected)),
                "expected error mentioning '{}', got {:?}",
                expected,
                errs
            );
        }

        let err = parse_config(yaml.to_string()).await.unwrap_err();
        assert!(err.to_string().contains("config is not valid"));
    }

    #[test]
    #[serial]
    fn env_vars_are_expanded_with_defaults() {
        std::env::set_var("TOKEN_REFRESH_TEST_CELL", "from-env");
        std::env::remove_var("TOKEN_REFRESH_TEST_MISSING");

        let expanded = expand_env_vars("a: ${TOKEN_REFRESH_TEST_CELL}\nb: ${TOKEN_REFRESH_TEST_MISSING:fallback}\n").unwrap();
        assert_eq!(expanded, "a: from-env\nb: fallback\n");

        std::env::remove_var("TOKEN_REFRESH_TEST_CELL");
    }

    #[tokio::test]
    #[serial]
    async fn config_file_is_loaded_with_env_expansion() {
        std::env::set_var("TOKEN_REFRESH_TEST_MARGIN", "42");
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "cell:\n  name: from-file\n  safety_margin_ms: ${{TOKEN_REFRESH_TEST_MARGIN}}").unwrap();

        let cfg = file_to_config(file.path()).await.expect("valid config file");
        assert_eq!(cfg.cell.name, "from-file");
        assert_eq!(cfg.cell.safety_margin_ms, 42);

        std::env::remove_var("TOKEN_REFRESH_TEST_MARGIN");
    }

    #[tokio::test]
    async fn cli_log_level_overrides_file_level() {
        let cfg = parse_config("settings:\n  logging:\n    level: warn\n    format: json\n".to_string())
            .await
            .unwrap();

        let from_file = resolve(&cfg, None);
        assert_eq!(from_file.level, "warn");
        assert_eq!(from_file.format, LogFormat::Json);

        let overridden = resolve(&cfg, Some(LogLevel::DEBUG));
        assert_eq!(overridden.level, "debug");
        assert_eq!(overridden.format, LogFormat::Json);
    }
}
