//! Authenticated JSON requests against the API.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::Result;
use crate::config::{Auth, Config};
use crate::endpoint::Endpoint;
use crate::error::{DecodeError, TransportError};
use crate::resources::{Companies, Contacts, Events};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Error body returned by the API on failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    correlation_id: Option<String>,
}

/// Configuration plus transport; every request goes through here.
///
/// Cloning is cheap and clones share the transport.
#[derive(Clone)]
pub struct Connection {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
}

impl Connection {
    pub fn new(config: Config, transport: impl Transport + 'static) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Company operations.
    pub fn companies(&self) -> Companies<'_> {
        Companies::new(self)
    }

    /// Contact operations.
    pub fn contacts(&self) -> Contacts<'_> {
        Contacts::new(self)
    }

    /// Event tracking.
    pub fn events(&self) -> Events<'_> {
        Events::new(self)
    }

    /// GET and parse the JSON response.
    #[instrument(skip(self, endpoint), fields(template = endpoint.template()))]
    pub fn get_json(&self, endpoint: &Endpoint) -> Result<Value> {
        let response = self.send(HttpMethod::Get, endpoint, None)?;
        parse_json(&response)
    }

    /// POST a JSON body and parse the JSON response.
    #[instrument(skip(self, endpoint, body), fields(template = endpoint.template()))]
    pub fn post_json(&self, endpoint: &Endpoint, body: Value) -> Result<Value> {
        let response = self.send(HttpMethod::Post, endpoint, Some(body))?;
        parse_json(&response)
    }

    /// POST a JSON body, checking only the status. Used by endpoints that
    /// answer with plain text.
    #[instrument(skip(self, endpoint, body), fields(template = endpoint.template()))]
    pub fn post_unparsed(&self, endpoint: &Endpoint, body: Value) -> Result<()> {
        self.send(HttpMethod::Post, endpoint, Some(body))?;
        Ok(())
    }

    /// PUT an optional JSON body and parse the JSON response.
    #[instrument(skip(self, endpoint, body), fields(template = endpoint.template()))]
    pub fn put_json(&self, endpoint: &Endpoint, body: Option<Value>) -> Result<Value> {
        let response = self.send(HttpMethod::Put, endpoint, body)?;
        parse_json(&response)
    }

    /// DELETE and parse the JSON response, if any.
    #[instrument(skip(self, endpoint), fields(template = endpoint.template()))]
    pub fn delete_json(&self, endpoint: &Endpoint) -> Result<Value> {
        let response = self.send(HttpMethod::Delete, endpoint, None)?;
        parse_json(&response)
    }

    /// GET against the event tracking host, without API credentials.
    ///
    /// Returns whether the server answered with a success status.
    #[instrument(skip(self, endpoint), fields(template = endpoint.template()))]
    pub fn track(&self, endpoint: &Endpoint) -> Result<bool> {
        let url = endpoint.url(self.config.event_base_url());
        debug!(host = url.host_str(), path = url.path(), "tracking request");

        let request = HttpRequest::new(HttpMethod::Get, url).timeout(self.config.timeout());
        let response = self.transport.execute(&request)?;
        trace!(status = response.status, "tracking response");

        Ok(response.is_success())
    }

    fn send(
        &self,
        method: HttpMethod,
        endpoint: &Endpoint,
        body: Option<Value>,
    ) -> Result<HttpResponse> {
        let auth = self.config.auth()?;
        let mut url = endpoint.url(self.config.base_url());
        debug!(%method, path = url.path(), "API request");
        trace!(query = ?endpoint.query_params(), "query parameters");

        let mut request = HttpRequest::new(method, url.clone()).timeout(self.config.timeout());
        match auth {
            Auth::Bearer(token) => {
                request = request.header("authorization", format!("Bearer {}", token));
            }
            Auth::ApiKey(key) => {
                url.query_pairs_mut().append_pair("hapikey", key);
                request.url = url;
            }
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = self.transport.execute(&request)?;
        trace!(status = response.status, "API response");

        if response.is_success() {
            Ok(response)
        } else {
            Err(status_error(&response).into())
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn parse_json(response: &HttpResponse) -> Result<Value> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| DecodeError::Json(e).into())
}

fn status_error(response: &HttpResponse) -> TransportError {
    let (message, correlation_id) = match serde_json::from_str::<ApiErrorBody>(&response.body) {
        Ok(body) => (body.message, body.correlation_id),
        Err(_) => (None, None),
    };
    TransportError::Status {
        status: response.status,
        message,
        correlation_id,
    }
}
