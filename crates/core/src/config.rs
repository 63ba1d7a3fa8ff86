use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WormError};
use crate::time::parse_duration_str;

const TRUE_VALUES: [&str; 3] = ["true", "t", "1"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LogLevel {
    #[default]
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Unknown names fall back to `Debug`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "INFO" => Self::Info,
            "WARNING" | "WARN" => Self::Warning,
            "ERROR" => Self::Error,
            "CRITICAL" => Self::Critical,
            _ => Self::Debug,
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub log_level: LogLevel,
    pub jaeger_query_url: String,
    pub lookback: Duration,
    pub request_timeout: Duration,
    pub interval: Duration,
    pub fail_on_error: bool,
    pub concurrency: usize,
    pub db_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let data_root = env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(home).join(".local/share"));

        Self {
            log_level: LogLevel::Debug,
            jaeger_query_url: "http://jaeger-query:16686/jaeger".to_string(),
            lookback: Duration::from_secs(60 * 60),
            request_timeout: Duration::from_secs(30),
            interval: Duration::from_secs(60 * 60),
            fail_on_error: false,
            concurrency: 1,
            db_path: data_root.join("worm/worm.duckdb"),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();
        let config_path = config_file_path();
        if let Some(file_overrides) = load_file_overrides(&config_path)? {
            apply_overrides(&mut cfg, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides(|key| env::var(key).ok())?;
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }
}

/// `true`, `t` and `1` (any case) are true; everything else is false.
pub fn parse_bool(raw: &str) -> bool {
    TRUE_VALUES.contains(&raw.trim().to_ascii_lowercase().as_str())
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    log_level: Option<String>,
    jaeger_query_url: Option<String>,
    lookback: Option<String>,
    request_timeout: Option<String>,
    interval_minutes: Option<u64>,
    fail_on_error: Option<bool>,
    concurrency: Option<usize>,
    db_path: Option<PathBuf>,
}

fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("WORM_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("worm/config.toml")
}

fn load_file_overrides(path: &Path) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| WormError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .map_err(|e| WormError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides<F>(lookup: F) -> Result<ConfigOverrides>
where
    F: Fn(&str) -> Option<String>,
{
    let interval_minutes = match lookup("WORKER_INTERVAL_MINUTES") {
        Some(v) => Some(v.trim().parse::<u64>().map_err(|e| {
            WormError::Config(format!("bad WORKER_INTERVAL_MINUTES in environment: {e}"))
        })?),
        None => None,
    };
    let concurrency = match lookup("WORKER_CONCURRENCY") {
        Some(v) => Some(v.trim().parse::<usize>().map_err(|e| {
            WormError::Config(format!("bad WORKER_CONCURRENCY in environment: {e}"))
        })?),
        None => None,
    };

    Ok(ConfigOverrides {
        log_level: lookup("LOG_LEVEL"),
        jaeger_query_url: lookup("JAEGER_QUERY_URL"),
        lookback: lookup("JAEGER_LOOKBACK"),
        request_timeout: lookup("JAEGER_REQUEST_TIMEOUT"),
        interval_minutes,
        fail_on_error: lookup("WORKER_FAIL_ON_ERROR").map(|v| parse_bool(&v)),
        concurrency,
        db_path: lookup("WORM_DB_PATH").map(PathBuf::from),
    })
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.log_level {
        cfg.log_level = LogLevel::parse(&v);
    }
    if let Some(v) = overrides.jaeger_query_url {
        cfg.jaeger_query_url = v.trim_end_matches('/').to_string();
    }
    if let Some(v) = overrides.lookback {
        cfg.lookback = parse_duration_str(&v)
            .map_err(|e| WormError::Config(format!("bad lookback in {source}: {e}")))?;
    }
    if let Some(v) = overrides.request_timeout {
        cfg.request_timeout = parse_duration_str(&v)
            .map_err(|e| WormError::Config(format!("bad request_timeout in {source}: {e}")))?;
    }
    if let Some(minutes) = overrides.interval_minutes {
        let secs = minutes.checked_mul(60).ok_or_else(|| {
            WormError::Config(format!("interval_minutes in {source} is too large: {minutes}"))
        })?;
        cfg.interval = Duration::from_secs(secs);
    }
    if let Some(v) = overrides.fail_on_error {
        cfg.fail_on_error = v;
    }
    if let Some(v) = overrides.concurrency {
        if v == 0 {
            return Err(WormError::Config(format!(
                "concurrency in {source} must be at least 1"
            )));
        }
        cfg.concurrency = v;
    }
    if let Some(v) = overrides.db_path {
        cfg.db_path = v;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_matches_worker_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.jaeger_query_url, "http://jaeger-query:16686/jaeger");
        assert_eq!(cfg.interval, Duration::from_secs(3600));
        assert_eq!(cfg.lookback, Duration::from_secs(3600));
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert!(!cfg.fail_on_error);
        assert_eq!(cfg.concurrency, 1);
    }

    #[test]
    fn parse_bool_accepts_true_spellings() {
        for raw in ["true", "TRUE", "t", "T", "1", " True "] {
            assert!(parse_bool(raw), "{raw} should be true");
        }
        for raw in ["false", "yes", "0", "", "on"] {
            assert!(!parse_bool(raw), "{raw} should be false");
        }
    }

    #[test]
    fn log_level_falls_back_to_debug() {
        assert_eq!(LogLevel::parse("warning"), LogLevel::Warning);
        assert_eq!(LogLevel::parse("CRITICAL").as_filter(), "error");
        assert_eq!(LogLevel::parse("verbose"), LogLevel::Debug);
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = Config::default();
        let overrides = load_env_overrides(lookup_from(&[
            ("LOG_LEVEL", "INFO"),
            ("JAEGER_QUERY_URL", "http://127.0.0.1:16686/"),
            ("WORKER_INTERVAL_MINUTES", "5"),
            ("WORKER_FAIL_ON_ERROR", "t"),
            ("JAEGER_LOOKBACK", "30m"),
            ("JAEGER_REQUEST_TIMEOUT", "3s"),
            ("WORKER_CONCURRENCY", "4"),
            ("WORM_DB_PATH", "/tmp/worm.duckdb"),
        ]))
        .unwrap();

        apply_overrides(&mut cfg, overrides, "environment").unwrap();

        assert_eq!(cfg.log_level, LogLevel::Info);
        assert_eq!(cfg.jaeger_query_url, "http://127.0.0.1:16686");
        assert_eq!(cfg.interval, Duration::from_secs(300));
        assert!(cfg.fail_on_error);
        assert_eq!(cfg.lookback, Duration::from_secs(1800));
        assert_eq!(cfg.request_timeout, Duration::from_secs(3));
        assert_eq!(cfg.concurrency, 4);
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/worm.duckdb"));
    }

    #[test]
    fn bad_values_are_config_errors() {
        let err = load_env_overrides(lookup_from(&[("WORKER_INTERVAL_MINUTES", "soon")]))
            .unwrap_err();
        assert!(matches!(err, WormError::Config(_)));

        let mut cfg = Config::default();
        let overrides = load_env_overrides(lookup_from(&[("WORKER_CONCURRENCY", "0")])).unwrap();
        assert!(apply_overrides(&mut cfg, overrides, "environment").is_err());

        let overrides = load_env_overrides(lookup_from(&[("JAEGER_LOOKBACK", "forever")])).unwrap();
        assert!(apply_overrides(&mut cfg, overrides, "environment").is_err());
    }

    #[test]
    fn oversized_interval_is_config_error() {
        let max = u64::MAX.to_string();
        let overrides =
            load_env_overrides(lookup_from(&[("WORKER_INTERVAL_MINUTES", max.as_str())])).unwrap();

        let mut cfg = Config::default();
        let err = apply_overrides(&mut cfg, overrides, "environment").unwrap_err();
        assert!(matches!(err, WormError::Config(_)));
        assert_eq!(cfg.interval, Duration::from_secs(3600));
    }

    #[test]
    fn file_overrides_parse_from_toml() {
        let parsed: ConfigOverrides = toml::from_str(
            r#"
            jaeger_query_url = "http://jaeger:16686"
            interval_minutes = 15
            fail_on_error = true
            "#,
        )
        .unwrap();

        let mut cfg = Config::default();
        apply_overrides(&mut cfg, parsed, "config file").unwrap();
        assert_eq!(cfg.jaeger_query_url, "http://jaeger:16686");
        assert_eq!(cfg.interval, Duration::from_secs(900));
        assert!(cfg.fail_on_error);
    }
}
