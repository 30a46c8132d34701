use polltail::{PollingWatcher, Settings};
use std::env;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_env_overrides_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let original_dir = env::current_dir().unwrap();
    env::set_current_dir(&temp_dir).unwrap();

    // Config file found by walking up from the current directory
    let config_dir = temp_dir.path().join(".polltail");
    fs::create_dir_all(&config_dir).unwrap();
    let toml_content = r#"
[watch]
poll_interval_ms = 100
max_permission_retries = 3

[logging]
default = "info"
"#;
    fs::write(config_dir.join("settings.toml"), toml_content).unwrap();

    unsafe {
        // Double underscore separates nested levels
        env::set_var("PT_WATCH__POLL_INTERVAL_MS", "40");
        env::set_var("PT_LOGGING__DEFAULT", "debug");
    }

    let settings = Settings::load();

    unsafe {
        env::remove_var("PT_WATCH__POLL_INTERVAL_MS");
        env::remove_var("PT_LOGGING__DEFAULT");
    }
    env::set_current_dir(original_dir).unwrap();

    let settings = settings.unwrap();

    // Environment variable overrides config file
    assert_eq!(settings.watch.poll_interval_ms, 40);
    assert_eq!(settings.logging.default, "debug");
    // Config file value used when no env var
    assert_eq!(settings.watch.max_permission_retries, 3);

    let watcher = PollingWatcher::from_settings("app.log", &settings).unwrap();
    assert_eq!(watcher.poll_interval(), Duration::from_millis(40));
    assert_eq!(watcher.max_permission_retries(), 3);
}
