//! Service configuration from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use solarwatch_backend::SessionContext;
use solarwatch_observability::LogFormat;
use solarwatch_status::{Locale, RETRAINING_THRESHOLD};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `BIND_ADDR`
    pub bind_addr: SocketAddr,

    /// `BACKEND_URL`; unset runs against the in-memory demo fleet.
    pub backend_url: Option<String>,

    /// `BACKEND_TIMEOUT_SECS`
    pub backend_timeout: Duration,

    /// `POLL_INTERVAL_SECS`; `0` disables the fleet poller.
    pub poll_interval: Option<Duration>,

    /// `POLLER_TOKEN`, relayed by the fleet poller.
    pub poller_session: SessionContext,

    /// `DEFAULT_LOCALE`, used when a request has no usable `Accept-Language`.
    pub default_locale: Locale,

    /// `LOG_FORMAT`
    pub log_format: LogFormat,

    /// `RETRAINING_THRESHOLD`: accumulated suspicious predictions before
    /// retraining is recommended.
    pub retraining_threshold: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            backend_url: None,
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
            poll_interval: Some(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS)),
            poller_session: SessionContext::anonymous(),
            default_locale: Locale::En,
            log_format: LogFormat::Json,
            retraining_threshold: RETRAINING_THRESHOLD,
        }
    }
}

impl ApiConfig {
    /// Load from the process environment (after `.env`, if present).
    ///
    /// Never fails: malformed values fall back to defaults with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr = parsed(&var, "BIND_ADDR", DEFAULT_BIND_ADDR, |v| v.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

        let backend_timeout = Duration::from_secs(
            parsed(&var, "BACKEND_TIMEOUT_SECS", DEFAULT_BACKEND_TIMEOUT_SECS, |v| {
                v.parse::<u64>().ok().filter(|s| *s > 0)
            })
            .unwrap_or(DEFAULT_BACKEND_TIMEOUT_SECS),
        );

        let poll_secs = parsed(&var, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS, |v| {
            v.parse::<u64>().ok()
        })
        .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        let default_locale =
            parsed(&var, "DEFAULT_LOCALE", "en", Locale::parse).unwrap_or_default();

        let log_format = parsed(&var, "LOG_FORMAT", "json", LogFormat::parse).unwrap_or_default();

        let retraining_threshold =
            parsed(&var, "RETRAINING_THRESHOLD", RETRAINING_THRESHOLD, |v| {
                v.parse::<usize>().ok().filter(|n| *n > 0)
            })
            .unwrap_or(RETRAINING_THRESHOLD);

        Self {
            bind_addr,
            backend_url: var("BACKEND_URL"),
            backend_timeout,
            poll_interval: (poll_secs > 0).then(|| Duration::from_secs(poll_secs)),
            poller_session: SessionContext {
                bearer_token: var("POLLER_TOKEN"),
            },
            default_locale,
            log_format,
            retraining_threshold,
        }
    }
}

/// `None` when unset; the default (with a warning) when malformed.
fn parsed<T, D: core::fmt::Display>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: D,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = var(key)?;
    let value = parse(&raw);
    if value.is_none() {
        tracing::warn!(key, value = %raw, default = %default, "ignoring malformed setting");
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> ApiConfig {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ApiConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let c = config(&[]);
        assert_eq!(c.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(c.backend_url, None);
        assert_eq!(c.backend_timeout, Duration::from_secs(30));
        assert_eq!(c.poll_interval, Some(Duration::from_secs(10)));
        assert_eq!(c.poller_session.bearer_token(), None);
        assert_eq!(c.default_locale, Locale::En);
        assert_eq!(c.retraining_threshold, 500);
    }

    #[test]
    fn explicit_values() {
        let c = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("BACKEND_URL", " http://backend:8000 "),
            ("BACKEND_TIMEOUT_SECS", "5"),
            ("POLL_INTERVAL_SECS", "0"),
            ("POLLER_TOKEN", "svc-token"),
            ("DEFAULT_LOCALE", "fr-FR"),
            ("LOG_FORMAT", "pretty"),
            ("RETRAINING_THRESHOLD", "25"),
        ]);
        assert_eq!(c.bind_addr.port(), 9000);
        assert_eq!(c.backend_url.as_deref(), Some("http://backend:8000"));
        assert_eq!(c.backend_timeout, Duration::from_secs(5));
        assert_eq!(c.poll_interval, None);
        assert_eq!(c.poller_session.bearer_token(), Some("svc-token"));
        assert_eq!(c.default_locale, Locale::Fr);
        assert_eq!(c.log_format, LogFormat::Pretty);
        assert_eq!(c.retraining_threshold, 25);
        assert!(!format!("{c:?}").contains("svc-token"));
    }

    #[test]
    fn malformed_values_fall_back() {
        let c = config(&[
            ("BIND_ADDR", "nowhere"),
            ("BACKEND_TIMEOUT_SECS", "0"),
            ("POLL_INTERVAL_SECS", "soon"),
            ("DEFAULT_LOCALE", "de"),
            ("BACKEND_URL", "   "),
            ("RETRAINING_THRESHOLD", "0"),
        ]);
        assert_eq!(c.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(c.backend_timeout, Duration::from_secs(30));
        assert_eq!(c.poll_interval, Some(Duration::from_secs(10)));
        assert_eq!(c.default_locale, Locale::En);
        assert_eq!(c.backend_url, None);
        assert_eq!(c.retraining_threshold, 500);
    }
}
