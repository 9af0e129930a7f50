//! Portal runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the backend client,
//! the lookup orchestrator, and the scanner. Nothing in this crate reads process environment
//! variables; the binaries read them and hand the raw values to the parsing helpers below.

use crate::constants::{
    AI_API_KEY_ENV, BACKEND_URL_ENV, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SCAN_INTERVAL,
    REQUEST_TIMEOUT_ENV, SCAN_INTERVAL_ENV,
};
use crate::ConfigError;
use reqwest::Url;
use std::time::Duration;

/// Portal configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct PortalConfig {
    backend_base: Url,
    request_timeout: Duration,
    scan_interval: Duration,
    ai_api_key: Option<String>,
}

impl PortalConfig {
    /// Create a new `PortalConfig` with the default timeout and scan interval.
    pub fn new(backend_base: Url) -> Self {
        Self {
            backend_base,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            ai_api_key: None,
        }
    }

    /// Resolve every setting through `lookup`, which maps an environment variable name to its
    /// value. Binaries pass `|name| std::env::var(name).ok()`.
    pub fn from_values(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base = backend_base_from_env_value(lookup(BACKEND_URL_ENV))?;
        let request_timeout = duration_from_env_value(
            REQUEST_TIMEOUT_ENV,
            lookup(REQUEST_TIMEOUT_ENV),
            DEFAULT_REQUEST_TIMEOUT,
            Duration::from_secs,
        )?;
        let scan_interval = duration_from_env_value(
            SCAN_INTERVAL_ENV,
            lookup(SCAN_INTERVAL_ENV),
            DEFAULT_SCAN_INTERVAL,
            Duration::from_millis,
        )?;

        Ok(Self::new(base)
            .with_request_timeout(request_timeout)
            .with_scan_interval(scan_interval)
            .with_ai_api_key(lookup(AI_API_KEY_ENV)))
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    pub fn with_ai_api_key(mut self, key: Option<String>) -> Self {
        self.ai_api_key = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
        self
    }

    pub fn backend_base(&self) -> &Url {
        &self.backend_base
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    /// The AI API key, for the chat assistant only.
    ///
    /// The key is optional at startup; its absence only fails the features that need it.
    pub fn require_ai_key(&self) -> Result<&str, ConfigError> {
        self.ai_api_key.as_deref().ok_or(ConfigError::MissingAiKey)
    }
}

/// Parse the backend base URL from an optional string value.
///
/// A missing or blank value is an error rather than a silent localhost default, so a
/// misconfigured deployment fails loudly at startup.
pub fn backend_base_from_env_value(value: Option<String>) -> Result<Url, ConfigError> {
    let raw = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingBackendUrl)?;

    let url = Url::parse(&raw).map_err(|e| ConfigError::InvalidBackendUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBackendUrl {
            url: raw,
            reason: "scheme must be http or https".into(),
        });
    }

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidBackendUrl {
            url: raw,
            reason: "URL cannot carry path segments".into(),
        });
    }

    Ok(url)
}

/// Parse a positive duration from an optional string value, falling back to `default`.
///
/// `unit` converts the parsed integer into a `Duration`, e.g. `Duration::from_secs`.
pub fn duration_from_env_value(
    name: &'static str,
    value: Option<String>,
    default: Duration,
    unit: fn(u64) -> Duration,
) -> Result<Duration, ConfigError> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(default),
        Some(v) => match v.parse::<u64>() {
            Ok(n) if n > 0 => Ok(unit(n)),
            _ => Err(ConfigError::InvalidDuration { name, value: v }),
        },
    }
}
