use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "FLOCK_ENV"));
}

#[test]
fn empty_env_yields_defaults() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.language, "en");
    assert_eq!(cfg.topics_path.to_str(), Some("./config/topics.yaml"));
    assert!(cfg.bearer_token.is_none());
    assert!(cfg.remote_sentiment);
    assert_eq!(cfg.reconnect_backoff_secs, 3);
    assert_eq!(cfg.replay_max_pages, 20);
    assert_eq!(cfg.replay_page_size, 100);
    assert!(cfg.replay_target_count.is_none());
    assert_eq!(cfg.replay_max_retries, 3);
    assert_eq!(cfg.replay_retry_backoff_ms, 1000);
    assert!(cfg.database_url.is_none());
    assert_eq!(cfg.db_max_connections, 10);
    assert_eq!(cfg.db_min_connections, 1);
    assert_eq!(cfg.db_acquire_timeout_secs, 10);
}

#[test]
fn overrides_are_applied() {
    let mut map = HashMap::new();
    map.insert("FLOCK_LANGUAGE", " ES ");
    map.insert("FLOCK_BEARER_TOKEN", "secret-token");
    map.insert("FLOCK_RECONNECT_BACKOFF_SECS", "7");
    map.insert("FLOCK_REPLAY_TARGET_COUNT", "500");
    map.insert("FLOCK_REMOTE_SENTIMENT", "off");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.language, "es");
    assert_eq!(cfg.bearer_token.as_deref(), Some("secret-token"));
    assert_eq!(cfg.reconnect_backoff_secs, 7);
    assert_eq!(cfg.replay_target_count, Some(500));
    assert!(!cfg.remote_sentiment);
}

#[test]
fn blank_bearer_token_is_treated_as_absent() {
    let mut map = HashMap::new();
    map.insert("FLOCK_BEARER_TOKEN", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.bearer_token.is_none());
}

#[test]
fn invalid_backoff_is_rejected() {
    let mut map = HashMap::new();
    map.insert("FLOCK_RECONNECT_BACKOFF_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FLOCK_RECONNECT_BACKOFF_SECS"),
        "expected InvalidEnvVar(FLOCK_RECONNECT_BACKOFF_SECS), got: {result:?}"
    );
}

#[test]
fn invalid_bool_is_rejected() {
    let mut map = HashMap::new();
    map.insert("FLOCK_REMOTE_SENTIMENT", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FLOCK_REMOTE_SENTIMENT"),
        "expected InvalidEnvVar(FLOCK_REMOTE_SENTIMENT), got: {result:?}"
    );
}

#[test]
fn invalid_target_count_is_rejected() {
    let mut map = HashMap::new();
    map.insert("FLOCK_REPLAY_TARGET_COUNT", "-5");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FLOCK_REPLAY_TARGET_COUNT")
    );
}

#[test]
fn empty_language_is_rejected() {
    let mut map = HashMap::new();
    map.insert("FLOCK_LANGUAGE", "  ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FLOCK_LANGUAGE")
    );
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = HashMap::new();
    map.insert("FLOCK_BEARER_TOKEN", "super-secret");
    map.insert("DATABASE_URL", "postgres://user:pw@localhost/flock");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(!rendered.contains("user:pw"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn cursor_path_sits_next_to_output() {
    let mut map = HashMap::new();
    map.insert("FLOCK_OUTPUT_PATH", "/data/out/items.jsonl");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.cursor_path().to_str(),
        Some("/data/out/items.jsonl.cursor.json")
    );
}
