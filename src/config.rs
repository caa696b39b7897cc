use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
// Generation runs the whole solver pipeline server-side.
const DEFAULT_GENERATE_TIMEOUT_SECS: u64 = 300;
const DEFAULT_SESSION_KEY: &str = "timetable_session";
const DEFAULT_LOG_FILTER: &str = "info";

/// Runtime configuration, resolved once at startup and provided through context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Service base address without a trailing slash.
    pub api_base: String,
    pub request_timeout: Duration,
    pub generate_timeout: Duration,
    /// localStorage key holding the serialized session.
    pub session_key: String,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            generate_timeout: Duration::from_secs(DEFAULT_GENERATE_TIMEOUT_SECS),
            session_key: DEFAULT_SESSION_KEY.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Resolve from variables baked in at build time (the browser has no
    /// process environment).
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::from_values(
            option_env!("TIMETABLE_API_BASE"),
            option_env!("TIMETABLE_TIMEOUT_SECS"),
            option_env!("TIMETABLE_GENERATE_TIMEOUT_SECS"),
            option_env!("TIMETABLE_LOG"),
        )
    }

    pub fn from_values(
        api_base: Option<&str>,
        timeout_secs: Option<&str>,
        generate_timeout_secs: Option<&str>,
        log_filter: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(base) = api_base {
            config.api_base = normalize_base(base)?;
        }
        if let Some(secs) = timeout_secs {
            config.request_timeout = parse_secs("TIMETABLE_TIMEOUT_SECS", secs)?;
        }
        if let Some(secs) = generate_timeout_secs {
            config.generate_timeout = parse_secs("TIMETABLE_GENERATE_TIMEOUT_SECS", secs)?;
        }
        if let Some(filter) = log_filter.filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter.trim().to_string();
        }
        Ok(config)
    }

    /// Compose a service-relative path with the base address.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_base, path)
        } else {
            format!("{}/{}", self.api_base, path)
        }
    }
}

/// Validate an absolute http(s) address and strip any trailing slash.
pub fn normalize_base(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|_| ConfigError::InvalidBase(raw.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ConfigError::InvalidBase(raw.to_string()));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

fn parse_secs(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = AppConfig::from_values(None, None, None, None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.api_base, "http://127.0.0.1:8000");
    }

    #[test]
    fn test_base_trailing_slash_removed() {
        let config =
            AppConfig::from_values(Some("https://sched.example.com/api/"), None, None, None)
                .unwrap();
        assert_eq!(config.api_base, "https://sched.example.com/api");
        assert_eq!(
            config.url_for("/json/42"),
            "https://sched.example.com/api/json/42"
        );
        assert_eq!(config.url_for("latest"), "https://sched.example.com/api/latest");
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(matches!(
            normalize_base("file:///mnt/data"),
            Err(ConfigError::InvalidBase(_))
        ));
        assert!(normalize_base("not a url").is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = AppConfig::from_values(None, Some("0"), None, None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber { key: "TIMETABLE_TIMEOUT_SECS", .. }
        ));
    }

    #[test]
    fn test_custom_timeouts_and_filter() {
        let config =
            AppConfig::from_values(None, Some("5"), Some("60"), Some(" debug ")).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.generate_timeout, Duration::from_secs(60));
        assert_eq!(config.log_filter, "debug");
    }
}
