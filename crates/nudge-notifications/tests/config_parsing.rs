use std::{env, fs};

use nudge_notifications::ConfigError;
use nudge_notifications::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("nudge.toml");

    let toml_content = r#"
[policy]
avoid_duplicates = false
max_pending_count = 64
coalesce_by_thread_id = true
clamp_text_length = true

[limits]
title_max_chars = 40
body_max_chars = 120

[trigger]
min_interval_secs = 0.1
utc_offset_minutes = 120

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert!(!cfg.policy.avoid_duplicates);
    assert_eq!(cfg.policy.max_pending_count, Some(64));
    assert_eq!(cfg.limits.title_max_chars, 40);
    assert_eq!(cfg.limits.body_max_chars, 120);
    assert_eq!(cfg.trigger.min_interval_secs, 0.1);
    assert_eq!(cfg.trigger.utc_offset_minutes, Some(120));
    assert_eq!(cfg.logging.level, "debug");

    // 2) Env override should win over file
    unsafe {
        env::set_var("NUDGE__LIMITS__TITLE_MAX_CHARS", "30");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.limits.title_max_chars, 30);
    unsafe {
        env::remove_var("NUDGE__LIMITS__TITLE_MAX_CHARS");
    }

    // 3) Invalid config should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[trigger]
min_interval_secs = -1.0
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("min_interval_secs")));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("absent.toml");

    let cfg = load_config(path.to_str()).expect("defaults should load");
    assert!(cfg.policy.avoid_duplicates);
    assert_eq!(cfg.policy.max_pending_count, None);
    assert_eq!(cfg.trigger.min_interval_secs, 1.0);
    assert_eq!(cfg.limits.body_max_chars, 200);
}
