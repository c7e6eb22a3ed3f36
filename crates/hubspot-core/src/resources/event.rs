//! Event tracking.

use tracing::{debug, instrument, warn};

use crate::Result;
use crate::config::ConfigKey;
use crate::connection::Connection;
use crate::endpoint::Endpoint;
use crate::error::ConfigurationError;

const COMPLETE_PATH: &str = "/v1/event";

#[derive(Debug, Clone, Copy)]
pub struct Events<'a> {
    conn: &'a Connection,
}

impl<'a> Events<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Record that the contact with `email` completed event `event_id`.
    ///
    /// Goes to the tracking host and carries the portal id instead of API
    /// credentials. Returns `Ok(false)` when the host answers with a non-2xx
    /// status.
    ///
    /// # Errors
    ///
    /// Fails without a request when `portal_id` is not configured, and on
    /// transport failures.
    #[instrument(skip(self))]
    pub fn complete(&self, event_id: &str, email: &str) -> Result<bool> {
        let portal_id = self
            .conn
            .config()
            .portal_id()
            .ok_or(ConfigurationError::NotConfigured {
                key: ConfigKey::PortalId.as_str(),
            })?;

        let endpoint = Endpoint::new(COMPLETE_PATH)
            .query("_n", event_id)
            .query("_a", portal_id)
            .query("email", email);

        let completed = self.conn.track(&endpoint)?;
        if completed {
            debug!("event recorded");
        } else {
            warn!("tracking host rejected event");
        }
        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ConfigOptions};
    use crate::error::{Error, TransportError};
    use crate::testing::{MockTransport, connection};
    use crate::transport::HttpResponse;

    #[test]
    fn complete_sends_event_portal_and_email() {
        let mock = MockTransport::new();
        mock.push(Ok(HttpResponse::new(200, "")));

        let conn = connection(&mock);
        assert!(conn.events().complete("000000001625", "a+b@example.com").unwrap());

        let req = mock.last_request();
        assert_eq!(req.url.host_str(), Some("track.hubspot.com"));
        assert_eq!(req.url.path(), COMPLETE_PATH);
        assert_eq!(
            req.url.query(),
            Some("_n=000000001625&_a=62515&email=a%2Bb%40example.com")
        );
        assert!(req.headers.is_empty());
    }

    #[test]
    fn rejected_event_is_false() {
        let mock = MockTransport::new();
        mock.push(Ok(HttpResponse::new(400, "bad event")));

        let conn = connection(&mock);
        assert!(!conn.events().complete("evt", "a@example.com").unwrap());
    }

    #[test]
    fn missing_portal_id_fails_before_any_request() {
        let mock = MockTransport::new();
        let config = Config::configure(ConfigOptions {
            hapikey: Some("demo".to_string()),
            ..Default::default()
        })
        .unwrap();
        let conn = Connection::new(config, mock.clone());

        let err = conn.events().complete("evt", "a@example.com").unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::NotConfigured { key: "portal_id" })
        ));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn transport_failure_is_an_error() {
        let mock = MockTransport::new();
        mock.push(Err(TransportError::Connection {
            message: "connection refused".to_string(),
        }));

        let conn = connection(&mock);
        assert!(conn.events().complete("evt", "a@example.com").is_err());
    }
}
