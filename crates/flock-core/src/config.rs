use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing is decoupled from the process environment so tests can drive it
/// with a plain `HashMap`.
#[allow(clippy::too_many_lines)]
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let env = parse_environment(&or_default("FLOCK_ENV", "development"))?;
    let log_level = or_default("FLOCK_LOG_LEVEL", "info");
    let topics_path = PathBuf::from(or_default("FLOCK_TOPICS_PATH", "./config/topics.yaml"));

    let language = or_default("FLOCK_LANGUAGE", "en").trim().to_lowercase();
    if language.is_empty() {
        return Err(invalid("FLOCK_LANGUAGE", "must be non-empty".to_string()));
    }

    let stream_url = or_default(
        "FLOCK_STREAM_URL",
        "https://stream.twitter.com/1.1/statuses/filter.json",
    );
    let search_url = or_default(
        "FLOCK_SEARCH_URL",
        "https://api.twitter.com/1.1/search/tweets.json",
    );
    let bearer_token = optional("FLOCK_BEARER_TOKEN");

    let sentiment_url = or_default(
        "FLOCK_SENTIMENT_URL",
        "http://text-processing.com/api/sentiment/",
    );
    let remote_sentiment = parse_bool("FLOCK_REMOTE_SENTIMENT", "true")?;

    let request_timeout_secs = parse_u64("FLOCK_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("FLOCK_USER_AGENT", "flock/0.1 (topic-ingest)");
    let reconnect_backoff_secs = parse_u64("FLOCK_RECONNECT_BACKOFF_SECS", "3")?;

    let replay_max_pages = parse_usize("FLOCK_REPLAY_MAX_PAGES", "20")?;
    let replay_page_size = parse_u32("FLOCK_REPLAY_PAGE_SIZE", "100")?;
    let replay_target_count = match optional("FLOCK_REPLAY_TARGET_COUNT") {
        Some(raw) => Some(
            raw.parse::<usize>()
                .map_err(|e| invalid("FLOCK_REPLAY_TARGET_COUNT", e.to_string()))?,
        ),
        None => None,
    };
    let replay_max_retries = parse_u32("FLOCK_REPLAY_MAX_RETRIES", "3")?;
    let replay_retry_backoff_ms = parse_u64("FLOCK_REPLAY_RETRY_BACKOFF_MS", "1000")?;

    let output_path = PathBuf::from(or_default("FLOCK_OUTPUT_PATH", "./saved-tweets.jsonl"));
    let unclassified_path =
        PathBuf::from(or_default("FLOCK_UNCLASSIFIED_PATH", "./unclassified.log"));

    let database_url = optional("DATABASE_URL");
    let db_max_connections = parse_u32("FLOCK_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("FLOCK_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("FLOCK_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        env,
        log_level,
        topics_path,
        language,
        stream_url,
        search_url,
        bearer_token,
        sentiment_url,
        remote_sentiment,
        request_timeout_secs,
        user_agent,
        reconnect_backoff_secs,
        replay_max_pages,
        replay_page_size,
        replay_target_count,
        replay_max_retries,
        replay_retry_backoff_ms,
        output_path,
        unclassified_path,
        database_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FLOCK_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
