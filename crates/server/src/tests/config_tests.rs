use super::*;

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn keeps_memory_and_full_urls_untouched() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url(" sqlite://./x.db "),
        "sqlite://./x.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:data\\x.db"),
        "sqlite://data/x.db"
    );
}

#[test]
fn empty_url_falls_back_to_default() {
    assert_eq!(normalize_database_url("  "), Settings::default().database_url);
}

#[test]
fn file_settings_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
        bind_addr = "0.0.0.0:9000"
        max_body_bytes = 1024
        "#,
    );
    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.max_body_bytes, 1024);
    assert_eq!(settings.database_url, Settings::default().database_url);
}

#[test]
fn unreadable_file_is_ignored() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "bind_addr = [");
    assert_eq!(settings, Settings::default());
}

#[test]
fn prefixed_env_vars_win_over_short_names() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[
            ("SERVER_BIND", "127.0.0.1:1"),
            ("APP__BIND_ADDR", "127.0.0.1:2"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("APP__MAX_BODY_BYTES", "2048"),
        ]),
    );
    assert_eq!(settings.server_bind, "127.0.0.1:2");
    assert_eq!(settings.database_url, "sqlite::memory:");
    assert_eq!(settings.max_body_bytes, 2048);
}

#[test]
fn invalid_body_limit_keeps_previous_value() {
    let mut settings = Settings::default();
    apply_env(&mut settings, env_from(&[("APP__MAX_BODY_BYTES", "lots")]));
    assert_eq!(settings.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    apply_env(&mut settings, env_from(&[("APP__MAX_BODY_BYTES", "0")]));
    assert_eq!(settings.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("nested").join("editor.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    assert!(dir.path().join("nested").exists());

    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);
    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );
}
