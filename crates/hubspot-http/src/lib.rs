//! hubspot-http - Blocking reqwest transport for hubspot-core.

use hubspot_core::{
    Config, Connection, HttpMethod, HttpRequest, HttpResponse, Transport, TransportError,
};
use tracing::{instrument, trace};

/// [`Transport`] backed by a blocking reqwest client.
///
/// The client must not be created or dropped on an async runtime thread; run
/// it from plain threads or `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Build a transport with the crate's user agent.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("hubspot-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(map_error)?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = request.url.path()))]
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(reqwest_method(request.method), request.url.clone());

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().map_err(map_error)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(map_error)?;
        trace!(status, bytes = body.len(), "HTTP response");

        Ok(HttpResponse::new(status, body))
    }
}

/// Build a [`Connection`] over a fresh [`ReqwestTransport`].
pub fn connect(config: Config) -> hubspot_core::Result<Connection> {
    Ok(Connection::new(config, ReqwestTransport::new()?))
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn map_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            message: err.to_string(),
        }
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    }
}
