use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive number of milliseconds, got {value:?}")]
    InvalidTimeout { name: &'static str, value: String },
    #[error("{0} is not configured")]
    Missing(&'static str),
}

/// Worker settings, read from `wrangler.toml` vars and secrets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    pub screenshot_api_url: String,
    pub screenshot_access_key: Option<String>,
    /// Remote stats generator, the built-in roller is used when unset.
    pub stats_api_url: Option<String>,
    /// Budget shared by all upstream calls made for one request.
    pub fetch_timeout: Duration,
}

impl WorkerConfig {
    pub const SCREENSHOT_API_URL: &'static str = "SCREENSHOT_API_URL";
    pub const SCREENSHOT_ACCESS_KEY: &'static str = "SCREENSHOT_ACCESS_KEY";
    pub const STATS_API_URL: &'static str = "STATS_API_URL";
    pub const FETCH_TIMEOUT_MS: &'static str = "FETCH_TIMEOUT_MS";

    pub const DEFAULT_SCREENSHOT_API_URL: &'static str = "https://api.screenshotone.com/take";
    pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = powercard_protocol::UPSTREAM_BUDGET_MS;

    /// Builds the config from a name lookup, blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let fetch_timeout = match get(Self::FETCH_TIMEOUT_MS) {
            None => Duration::from_millis(Self::DEFAULT_FETCH_TIMEOUT_MS),
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        name: Self::FETCH_TIMEOUT_MS,
                        value: raw,
                    });
                }
            },
        };

        Ok(Self {
            screenshot_api_url: get(Self::SCREENSHOT_API_URL)
                .unwrap_or_else(|| Self::DEFAULT_SCREENSHOT_API_URL.to_string()),
            screenshot_access_key: get(Self::SCREENSHOT_ACCESS_KEY),
            stats_api_url: get(Self::STATS_API_URL),
            fetch_timeout,
        })
    }

    pub fn from_env(env: &worker::Env) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| {
            env.var(name)
                .map(|value| value.to_string())
                .or_else(|_| env.secret(name).map(|value| value.to_string()))
                .ok()
        })
    }

    pub fn screenshot_access_key(&self) -> Result<&str, ConfigError> {
        self.screenshot_access_key
            .as_deref()
            .ok_or(ConfigError::Missing(Self::SCREENSHOT_ACCESS_KEY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<WorkerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WorkerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config(&[]).unwrap();

        assert_eq!(config.screenshot_api_url, WorkerConfig::DEFAULT_SCREENSHOT_API_URL);
        assert_eq!(config.screenshot_access_key, None);
        assert_eq!(config.stats_api_url, None);
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(
            config.screenshot_access_key(),
            Err(ConfigError::Missing("SCREENSHOT_ACCESS_KEY"))
        );
    }

    #[test]
    fn reads_every_variable() {
        let config = config(&[
            ("SCREENSHOT_API_URL", "https://shots.example.com/take"),
            ("SCREENSHOT_ACCESS_KEY", "secret"),
            ("STATS_API_URL", "https://stats.example.com"),
            ("FETCH_TIMEOUT_MS", "5000"),
        ])
        .unwrap();

        assert_eq!(config.screenshot_api_url, "https://shots.example.com/take");
        assert_eq!(config.screenshot_access_key(), Ok("secret"));
        assert_eq!(config.stats_api_url.as_deref(), Some("https://stats.example.com"));
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config(&[("STATS_API_URL", "  "), ("SCREENSHOT_API_URL", "")]).unwrap();

        assert_eq!(config.stats_api_url, None);
        assert_eq!(config.screenshot_api_url, WorkerConfig::DEFAULT_SCREENSHOT_API_URL);
    }

    #[test]
    fn rejects_bad_timeouts() {
        for value in ["soon", "0", "-5"] {
            assert!(matches!(
                config(&[("FETCH_TIMEOUT_MS", value)]),
                Err(ConfigError::InvalidTimeout { .. })
            ));
        }
    }
}
