//! hubspot-core - CRM client types, pagination and resource clients.
//!
//! This crate does no networking of its own. Requests go through a
//! [`Transport`]; `hubspot-http` provides the reqwest implementation.
//!
//! ```
//! use hubspot_core::{Config, ConfigOptions};
//!
//! let config = Config::configure(ConfigOptions {
//!     hapikey: Some("demo".to_string()),
//!     ..Default::default()
//! })
//! .unwrap();
//! assert_eq!(config.base_url().as_str(), "https://api.hubapi.com/");
//! ```

pub mod config;
pub mod connection;
pub mod endpoint;
pub mod error;
pub mod paged;
pub mod properties;
pub mod resources;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::{Auth, Config, ConfigKey, ConfigOptions};
pub use connection::Connection;
pub use endpoint::{Endpoint, QueryParams};
pub use error::{ConfigurationError, DecodeError, Error, TransportError};
pub use paged::{Page, PageConfig, PagedCollection};
pub use properties::Properties;
pub use resources::{
    Companies, Company, CompanyId, CompanyUpdate, Contact, ContactRef, Contacts, Events,
};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
