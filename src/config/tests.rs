//! Configuration loading tests

use super::*;
use figment::Jail;

#[test]
fn test_config_loads_defaults() {
    Jail::expect_with(|_jail| {
        let config = GistwatchConfig::load().map_err(|e| e.to_string())?;

        assert_eq!(config, GistwatchConfig::default());
        assert_eq!(config.scan.interval_secs, 5);
        assert_eq!(config.inspector.keywords, vec!["secret", "password"]);
        assert_eq!(config.server.page_size, 10);
        assert!(config.scan.excluded_extensions.contains(&"ipynb".to_string()));
        Ok(())
    });
}

#[test]
fn test_repo_config_overrides_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "gistwatch.toml",
            r#"
            [scan]
            interval_secs = 30
            excluded_files = ["*.ci-metadata"]

            [feed]
            username = "watcher"
            token = "abc123"
            "#,
        )?;

        let config = GistwatchConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.scan.interval_secs, 30);
        assert_eq!(config.scan.excluded_files, vec!["*.ci-metadata"]);
        assert_eq!(config.feed.username.as_deref(), Some("watcher"));
        // Untouched sections keep their defaults
        assert_eq!(config.storage.path, std::path::PathBuf::from("gistwatch.db"));
        Ok(())
    });
}

#[test]
fn test_env_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file("gistwatch.toml", "[scan]\ninterval_secs = 30\n")?;
        jail.set_env("GISTWATCH_SCAN__INTERVAL_SECS", "7");
        jail.set_env("GISTWATCH_SERVER__PORT", "8088");

        let config = GistwatchConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.scan.interval_secs, 7);
        assert_eq!(config.server.port, 8088);
        Ok(())
    });
}

#[test]
fn test_cli_overrides_win() {
    Jail::expect_with(|jail| {
        jail.create_file("gistwatch.toml", "[feed]\ntoken = \"from-file\"\n[scan]\ninterval_secs = 30\n")?;
        jail.set_env("GISTWATCH_SCAN__INTERVAL_SECS", "7");

        let overrides = CliOverrides {
            db: Some(std::path::PathBuf::from("data/watch.db")),
            token: Some("from-cli".to_string()),
            username: Some("octocat".to_string()),
            interval_secs: Some(2),
        };
        let config = GistwatchConfig::load_with_overrides(None, &overrides).map_err(|e| e.to_string())?;

        assert_eq!(config.scan.interval_secs, 2);
        assert_eq!(config.feed.token.as_deref(), Some("from-cli"));
        assert_eq!(config.feed.username.as_deref(), Some("octocat"));
        assert_eq!(config.storage.path, std::path::PathBuf::from("data/watch.db"));
        // Keys without an override keep their layered value
        assert_eq!(config.server.port, 3000);
        Ok(())
    });
}

#[test]
fn test_empty_overrides_change_nothing() {
    Jail::expect_with(|jail| {
        jail.create_file("gistwatch.toml", "[scan]\ninterval_secs = 30\n")?;

        let config =
            GistwatchConfig::load_with_overrides(None, &CliOverrides::default()).map_err(|e| e.to_string())?;
        assert_eq!(config.scan.interval_secs, 30);
        Ok(())
    });
}

#[test]
fn test_custom_yaml_config() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "custom.yml",
            "inspector:\n  kind: external\n  command: detect-secrets-hook\n  timeout_secs: 9\n",
        )?;

        let config =
            GistwatchConfig::load_with_custom_config(Some("custom.yml")).map_err(|e| e.to_string())?;
        assert_eq!(config.inspector.kind, InspectorKind::External);
        assert_eq!(config.inspector.command.as_deref(), Some("detect-secrets-hook"));
        assert_eq!(config.inspector.timeout_secs, 9);
        Ok(())
    });
}

#[test]
fn test_missing_custom_config_is_an_error() {
    Jail::expect_with(|_jail| {
        assert!(GistwatchConfig::load_with_custom_config(Some("non_existent.toml")).is_err());
        Ok(())
    });
}

#[test]
fn test_validation_rejects_bad_values() {
    let mut config = GistwatchConfig::default();
    config.scan.interval_secs = 0;
    assert!(config.validate().is_err());

    let mut config = GistwatchConfig::default();
    config.inspector.kind = InspectorKind::External;
    assert!(config.validate().is_err());
    config.inspector.command = Some("detector".to_string());
    assert!(config.validate().is_ok());

    let mut config = GistwatchConfig::default();
    config.inspector.patterns = vec!["(unclosed".to_string()];
    assert!(config.validate().is_err());

    let mut config = GistwatchConfig::default();
    config.feed.username = Some("someone".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn test_redacted_hides_token() {
    let mut config = GistwatchConfig::default();
    config.feed.token = Some("ghp_realtoken".to_string());

    let redacted = config.redacted();
    assert_eq!(redacted.feed.token.as_deref(), Some("********"));
    assert_eq!(config.feed.token.as_deref(), Some("ghp_realtoken"));
}

#[test]
fn test_per_page_is_clamped() {
    let mut config = GistwatchConfig::default();
    config.feed.per_page = 500;
    assert_eq!(config.effective_per_page(), 100);
    config.feed.per_page = 0;
    assert_eq!(config.effective_per_page(), 1);
}
