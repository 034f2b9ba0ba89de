use cmdbridge::config::Config;
use std::io::Write;

#[tokio::test]
async fn create_default_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let path = path.to_str().unwrap();

    Config::create_default(path).await.unwrap();
    let loaded = Config::load(path).await.unwrap();
    assert_eq!(loaded.bridge.primary_prefix, "!cmd");
    assert_eq!(loaded.delivery.line_delay_ms, 150);
    assert_eq!(loaded.service.model, "gemini-pro");
}

#[test]
fn load_reports_missing_file() {
    let err = tokio_test::block_on(Config::load("/nonexistent/cmdbridge.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn load_reports_bad_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[delivery]\nline_delay_ms = \"fast\"").unwrap();
    let err = tokio_test::block_on(Config::load(file.path().to_str().unwrap())).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn sparse_file_fills_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[delivery]\nline_delay_ms = 50").unwrap();
    let config = tokio_test::block_on(Config::load(file.path().to_str().unwrap())).unwrap();
    assert_eq!(config.delivery.line_delay_ms, 50);
    assert_eq!(config.delivery.stats_interval_ms, 60_000);
    assert_eq!(config.bridge.alias_prefix, "!커맨드");
    assert_eq!(config.logging.level, "info");
}
