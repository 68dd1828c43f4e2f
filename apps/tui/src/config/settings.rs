use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://apiti.onrender.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_REFERENCE_TTL_SECS: u64 = 5 * 60;
pub const DEFAULT_GEO_TTL_SECS: u64 = 10 * 60;
pub const DEFAULT_SWEEP_SECS: u64 = 60;
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a positive number of seconds, got {value:?}")]
    InvalidSeconds { name: &'static str, value: String },

    #[error("{name} must be an http(s) URL, got {value:?}")]
    InvalidUrl { name: &'static str, value: String },
}

/// Settings for the HTTP client and its response cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub reference_ttl: Duration,
    pub geographic_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            reference_ttl: Duration::from_secs(DEFAULT_REFERENCE_TTL_SECS),
            geographic_ttl: Duration::from_secs(DEFAULT_GEO_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub log_dir: PathBuf,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            debug: false,
        }
    }
}

/// Loads `.env` (if any) and reads the configuration from the environment.
pub fn init_app_config() -> Result<AppConfig, ConfigError> {
    dotenv().ok();
    AppConfig::from_lookup(|name| env::var(name).ok())
}

impl AppConfig {
    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let base_url = match lookup("AGRIVISION_API_URL") {
            Some(value) => parse_url("AGRIVISION_API_URL", &value)?,
            None => defaults.base_url,
        };

        let api = ApiConfig {
            base_url,
            timeout: seconds(&lookup, "AGRIVISION_TIMEOUT_SECS", defaults.timeout)?,
            reference_ttl: seconds(
                &lookup,
                "AGRIVISION_REFERENCE_TTL_SECS",
                defaults.reference_ttl,
            )?,
            geographic_ttl: seconds(&lookup, "AGRIVISION_GEO_TTL_SECS", defaults.geographic_ttl)?,
            sweep_interval: seconds(&lookup, "AGRIVISION_SWEEP_SECS", defaults.sweep_interval)?,
        };

        let log_dir = lookup("AGRIVISION_LOG_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_LOG_DIR), PathBuf::from);

        let debug = lookup("DEBUG").is_some_and(|value| value != "0" && !value.is_empty());

        Ok(Self {
            api,
            log_dir,
            debug,
        })
    }
}

fn seconds<F>(lookup: &F, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };

    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidSeconds { name, value: raw }),
    }
}

fn parse_url(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/');
    if (trimmed.starts_with("http://") || trimmed.starts_with("https://"))
        && reqwest::Url::parse(trimmed).is_ok()
    {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::InvalidUrl {
            name,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.api.timeout, Duration::from_secs(15));
        assert_eq!(config.api.reference_ttl, Duration::from_secs(300));
        assert_eq!(config.api.geographic_ttl, Duration::from_secs(600));
        assert_eq!(config.api.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert!(!config.debug);
    }

    #[test]
    fn overrides_are_applied_and_trailing_slash_trimmed() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("AGRIVISION_API_URL", "http://localhost:8000/"),
            ("AGRIVISION_TIMEOUT_SECS", "3"),
            ("AGRIVISION_GEO_TTL_SECS", "1200"),
            ("AGRIVISION_LOG_DIR", "/tmp/agri"),
            ("DEBUG", "1"),
        ]))
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout, Duration::from_secs(3));
        assert_eq!(config.api.geographic_ttl, Duration::from_secs(1200));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/agri"));
        assert!(config.debug);
    }

    #[test]
    fn zero_or_garbage_seconds_are_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("AGRIVISION_SWEEP_SECS", "0")]));
        assert!(matches!(
            err,
            Err(ConfigError::InvalidSeconds {
                name: "AGRIVISION_SWEEP_SECS",
                ..
            })
        ));

        let err = AppConfig::from_lookup(lookup_from(&[("AGRIVISION_TIMEOUT_SECS", "soon")]));
        assert!(err.is_err());
    }

    #[test]
    fn non_http_url_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("AGRIVISION_API_URL", "ftp://example")]));
        assert!(matches!(err, Err(ConfigError::InvalidUrl { .. })));
    }
}
