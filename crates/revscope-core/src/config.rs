use std::str::FromStr;

use crate::app_config::{AppConfig, CrawlConfig, Environment, PipelineConfig};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing is decoupled from the process environment so it can be tested with
/// a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::time::Duration;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let env = parse_environment(&or_default("REVSCOPE_ENV", "development"))?;
    let bind_addr: SocketAddr = parse_var(&or_default, "REVSCOPE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("REVSCOPE_LOG_LEVEL", "info");

    let password_salt = lookup("REVSCOPE_PASSWORD_SALT")
        .ok()
        .filter(|s| !s.trim().is_empty());
    if password_salt.is_none() && env != Environment::Development {
        return Err(ConfigError::MissingEnvVar(
            "REVSCOPE_PASSWORD_SALT".to_string(),
        ));
    }

    let pipeline = PipelineConfig {
        output_dir: PathBuf::from(or_default("REVSCOPE_OUTPUT_DIR", "./database")),
        min_content_len: parse_var(&or_default, "REVSCOPE_MIN_CONTENT_LEN", "2")?,
        dedup_prefix_chars: parse_var(&or_default, "REVSCOPE_DEDUP_PREFIX_CHARS", "80")?,
        max_features: parse_var(&or_default, "REVSCOPE_MAX_FEATURES", "5000")?,
    };
    if pipeline.dedup_prefix_chars == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "REVSCOPE_DEDUP_PREFIX_CHARS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if pipeline.max_features == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "REVSCOPE_MAX_FEATURES".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let crawl = CrawlConfig {
        target_count: parse_var(&or_default, "REVSCOPE_CRAWL_TARGET", "500")?,
        max_no_growth: parse_var(&or_default, "REVSCOPE_CRAWL_MAX_NO_GROWTH", "20")?,
        poll_timeout: Duration::from_millis(parse_var(
            &or_default,
            "REVSCOPE_CRAWL_POLL_TIMEOUT_MS",
            "8000",
        )?),
        poll_interval: Duration::from_millis(parse_var(
            &or_default,
            "REVSCOPE_CRAWL_POLL_INTERVAL_MS",
            "400",
        )?),
        max_polls: parse_var(&or_default, "REVSCOPE_CRAWL_MAX_POLLS", "200")?,
        max_duration: Duration::from_secs(parse_var(
            &or_default,
            "REVSCOPE_CRAWL_MAX_DURATION_SECS",
            "600",
        )?),
    };
    if crawl.max_no_growth == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "REVSCOPE_CRAWL_MAX_NO_GROWTH".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        password_salt,
        pipeline,
        crawl,
    })
}

/// Read `var` (or its default) and parse it with `FromStr`.
fn parse_var<T, D>(or_default: &D, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    D: Fn(&str, &str) -> String,
{
    let raw = or_default(var, default);
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "REVSCOPE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
