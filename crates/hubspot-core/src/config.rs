//! Client configuration.
//!
//! A [`Config`] is built once and handed to a [`Connection`](crate::Connection);
//! it is never mutated behind the caller's back.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Result;
use crate::error::ConfigurationError;

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://api.hubapi.com";

/// Default host for event tracking.
pub const DEFAULT_EVENT_BASE_URL: &str = "https://track.hubspot.com";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Names of the configuration values that can be required with
/// [`Config::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Hapikey,
    AccessToken,
    PortalId,
}

impl ConfigKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Hapikey => "hapikey",
            ConfigKey::AccessToken => "access_token",
            ConfigKey::PortalId => "portal_id",
        }
    }
}

/// Credentials attached to API requests.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Auth<'a> {
    /// Sent as `Authorization: Bearer <token>`.
    Bearer(&'a str),
    /// Sent as the `hapikey` query parameter.
    ApiKey(&'a str),
}

impl fmt::Debug for Auth<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Bearer(_) => f.write_str("Bearer([REDACTED])"),
            Auth::ApiKey(_) => f.write_str("ApiKey([REDACTED])"),
        }
    }
}

/// Raw configuration values, as read from a file or assembled by hand.
///
/// Unset fields fall back to defaults when converted with
/// [`Config::configure`].
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ConfigOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hapikey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for ConfigOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOptions")
            .field("hapikey", &self.hapikey.as_ref().map(|_| "[REDACTED]"))
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("portal_id", &self.portal_id)
            .field("base_url", &self.base_url)
            .field("event_base_url", &self.event_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Immutable client configuration.
///
/// # Example
///
/// ```
/// use hubspot_core::{Config, ConfigOptions};
///
/// let config = Config::configure(ConfigOptions {
///     hapikey: Some("demo".to_string()),
///     portal_id: Some("62515".to_string()),
///     ..Default::default()
/// })
/// .unwrap();
/// assert_eq!(config.base_url().as_str(), "https://api.hubapi.com/");
/// assert_eq!(config.portal_id(), Some("62515"));
/// ```
#[derive(Clone)]
pub struct Config {
    hapikey: Option<String>,
    access_token: Option<String>,
    portal_id: Option<String>,
    base_url: Url,
    event_base_url: Url,
    timeout: Duration,
}

impl Config {
    /// Build a configuration from raw options.
    ///
    /// # Errors
    ///
    /// Returns an error if either base URL is not an absolute http(s) URL.
    pub fn configure(options: ConfigOptions) -> Result<Self> {
        let defaults = Self::default();

        let base_url = match options.base_url.as_deref() {
            Some(s) => parse_base_url(s)?,
            None => defaults.base_url,
        };
        let event_base_url = match options.event_base_url.as_deref() {
            Some(s) => parse_base_url(s)?,
            None => defaults.event_base_url,
        };

        Ok(Self {
            hapikey: non_empty(options.hapikey),
            access_token: non_empty(options.access_token),
            portal_id: non_empty(options.portal_id),
            base_url,
            event_base_url,
            timeout: options
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        })
    }

    /// Restore every value to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fail fast when any of `keys` was never set.
    pub fn ensure(&self, keys: &[ConfigKey]) -> Result<()> {
        for key in keys {
            let set = match key {
                ConfigKey::Hapikey => self.hapikey.is_some(),
                ConfigKey::AccessToken => self.access_token.is_some(),
                ConfigKey::PortalId => self.portal_id.is_some(),
            };
            if !set {
                return Err(ConfigurationError::NotConfigured { key: key.as_str() }.into());
            }
        }
        Ok(())
    }

    /// Credentials for API requests. An access token takes precedence over
    /// an API key.
    pub fn auth(&self) -> Result<Auth<'_>> {
        match (&self.access_token, &self.hapikey) {
            (Some(token), _) => Ok(Auth::Bearer(token)),
            (None, Some(key)) => Ok(Auth::ApiKey(key)),
            (None, None) => Err(ConfigurationError::NotConfigured {
                key: ConfigKey::Hapikey.as_str(),
            }
            .into()),
        }
    }

    pub fn hapikey(&self) -> Option<&str> {
        self.hapikey.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn portal_id(&self) -> Option<&str> {
        self.portal_id.as_deref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn event_base_url(&self) -> &Url {
        &self.event_base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hapikey: None,
            access_token: None,
            portal_id: None,
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            event_base_url: Url::parse(DEFAULT_EVENT_BASE_URL)
                .expect("default event URL is valid"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("hapikey", &self.hapikey.as_ref().map(|_| "[REDACTED]"))
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("portal_id", &self.portal_id)
            .field("base_url", &self.base_url.as_str())
            .field("event_base_url", &self.event_base_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_base_url(s: &str) -> Result<Url> {
    let invalid = |reason: &str| ConfigurationError::InvalidBaseUrl {
        value: s.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(s).map_err(|e| invalid(&e.to_string()))?;

    if url.cannot_be_a_base() {
        return Err(invalid("must be an absolute URL").into());
    }
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(invalid("must use http or https").into());
    }
    if url.host_str().is_none() {
        return Err(invalid("must have a host").into());
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.base_url().as_str(), "https://api.hubapi.com/");
        assert_eq!(config.event_base_url().as_str(), "https://track.hubspot.com/");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert!(config.hapikey().is_none());
    }

    #[test]
    fn configure_overrides_and_reset_restores() {
        let mut config = Config::configure(ConfigOptions {
            hapikey: Some("demo".to_string()),
            base_url: Some("http://127.0.0.1:9000".to_string()),
            timeout_secs: Some(5),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.hapikey(), Some("demo"));
        assert_eq!(config.base_url().as_str(), "http://127.0.0.1:9000/");
        assert_eq!(config.timeout(), Duration::from_secs(5));

        config.reset();
        assert!(config.hapikey().is_none());
        assert_eq!(config.base_url().as_str(), "https://api.hubapi.com/");
    }

    #[test]
    fn ensure_names_the_first_missing_key() {
        let config = Config::configure(ConfigOptions {
            hapikey: Some("demo".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert!(config.ensure(&[ConfigKey::Hapikey]).is_ok());
        let err = config
            .ensure(&[ConfigKey::Hapikey, ConfigKey::PortalId])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::NotConfigured { key: "portal_id" })
        ));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = Config::configure(ConfigOptions {
            portal_id: Some("  ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(config.ensure(&[ConfigKey::PortalId]).is_err());
    }

    #[test]
    fn auth_prefers_access_token() {
        let both = Config::configure(ConfigOptions {
            hapikey: Some("key".to_string()),
            access_token: Some("token".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(both.auth().unwrap(), Auth::Bearer("token"));

        let key_only = Config::configure(ConfigOptions {
            hapikey: Some("key".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(key_only.auth().unwrap(), Auth::ApiKey("key"));
    }

    #[test]
    fn auth_without_credentials_is_a_configuration_error() {
        let err = Config::default().auth().unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: 'hapikey' not configured"
        );
    }

    #[test]
    fn rejects_bad_base_urls() {
        for bad in ["not a url", "mailto:someone@example.com", "ftp://example.com"] {
            let result = Config::configure(ConfigOptions {
                base_url: Some(bad.to_string()),
                ..Default::default()
            });
            assert!(
                matches!(
                    result,
                    Err(Error::Configuration(ConfigurationError::InvalidBaseUrl { .. }))
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = Config::configure(ConfigOptions {
            hapikey: Some("super-secret".to_string()),
            access_token: Some("also-secret".to_string()),
            ..Default::default()
        })
        .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("also-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn options_deserialize_from_partial_json() {
        let options: ConfigOptions =
            serde_json::from_str(r#"{"hapikey": "demo", "portal_id": "62515"}"#).unwrap();
        let config = Config::configure(options).unwrap();
        assert_eq!(config.portal_id(), Some("62515"));
        assert_eq!(config.base_url().as_str(), DEFAULT_BASE_URL.to_string() + "/");
    }
}
