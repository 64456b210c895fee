use std::time::Duration;

use crate::api::PollPolicy;
use crate::error::ConfigError;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a server running locally.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the receipt server (default: `http://localhost:8080`).
    pub server_url: String,
    /// Timeout applied to every HTTP request (default: `30` seconds).
    pub request_timeout: Duration,
    /// How job-status polling is paced and bounded.
    pub poll: PollPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".into(),
            request_timeout: Duration::from_secs(30),
            poll: PollPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `RECEIPT_SERVER_URL`      | `http://localhost:8080` |
    /// | `POLL_INTERVAL_MS`        | `1000`                  |
    /// | `POLL_MAX_ATTEMPTS`       | unset (unbounded)       |
    /// | `POLL_BACKOFF_MULTIPLIER` | `1.0`                   |
    /// | `POLL_MAX_INTERVAL_MS`    | `30000`                 |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let server_url = lookup("RECEIPT_SERVER_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.server_url);

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_var(
                "REQUEST_TIMEOUT_SECS",
                &raw,
                "a whole number of seconds",
            )?),
            None => defaults.request_timeout,
        };

        let mut poll = defaults.poll;
        if let Some(raw) = lookup("POLL_INTERVAL_MS") {
            poll.interval = Duration::from_millis(parse_var(
                "POLL_INTERVAL_MS",
                &raw,
                "a whole number of milliseconds",
            )?);
        }
        if let Some(raw) = lookup("POLL_MAX_ATTEMPTS") {
            let attempts: u32 = parse_var("POLL_MAX_ATTEMPTS", &raw, "a positive integer")?;
            if attempts == 0 {
                return Err(ConfigError::Invalid {
                    name: "POLL_MAX_ATTEMPTS",
                    expected: "a positive integer",
                    value: raw,
                });
            }
            poll.max_attempts = Some(attempts);
        }
        if let Some(raw) = lookup("POLL_BACKOFF_MULTIPLIER") {
            let multiplier: f64 =
                parse_var("POLL_BACKOFF_MULTIPLIER", &raw, "a number >= 1.0")?;
            if !(multiplier >= 1.0 && multiplier.is_finite()) {
                return Err(ConfigError::Invalid {
                    name: "POLL_BACKOFF_MULTIPLIER",
                    expected: "a number >= 1.0",
                    value: raw,
                });
            }
            poll.multiplier = multiplier;
        }
        if let Some(raw) = lookup("POLL_MAX_INTERVAL_MS") {
            poll.max_interval = Duration::from_millis(parse_var(
                "POLL_MAX_INTERVAL_MS",
                &raw,
                "a whole number of milliseconds",
            )?);
        }

        Ok(Self {
            server_url,
            request_timeout,
            poll,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    raw: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        expected,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config.server_url, "http://localhost:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.poll.interval, Duration::from_millis(1000));
        assert_eq!(config.poll.max_attempts, None);
        assert_eq!(config.poll.multiplier, 1.0);
    }

    #[test]
    fn server_url_loses_trailing_slash() {
        let config = load(&[("RECEIPT_SERVER_URL", "http://receipts.lan:8080/")]).unwrap();
        assert_eq!(config.server_url, "http://receipts.lan:8080");
    }

    #[test]
    fn poll_settings_are_read() {
        let config = load(&[
            ("POLL_INTERVAL_MS", "250"),
            ("POLL_MAX_ATTEMPTS", "40"),
            ("POLL_BACKOFF_MULTIPLIER", "1.5"),
            ("POLL_MAX_INTERVAL_MS", "5000"),
        ])
        .unwrap();
        assert_eq!(config.poll.interval, Duration::from_millis(250));
        assert_eq!(config.poll.max_attempts, Some(40));
        assert_eq!(config.poll.multiplier, 1.5);
        assert_eq!(config.poll.max_interval, Duration::from_millis(5000));
    }

    #[test]
    fn malformed_interval_is_rejected() {
        let err = load(&[("POLL_INTERVAL_MS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("POLL_INTERVAL_MS"));
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        assert!(load(&[("POLL_MAX_ATTEMPTS", "0")]).is_err());
    }

    #[test]
    fn shrinking_backoff_is_rejected() {
        assert!(load(&[("POLL_BACKOFF_MULTIPLIER", "0.5")]).is_err());
    }
}
