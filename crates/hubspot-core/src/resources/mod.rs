//! Resource clients: companies, contacts and events.
//!
//! Each client borrows a [`Connection`](crate::Connection), owns its endpoint
//! templates, and normalizes its list responses into [`Page`](crate::Page)s.
//! The response field names differ per endpoint and are kept explicit in each
//! fetch closure.

mod company;
mod contact;
mod event;

pub use company::{Companies, Company, CompanyId, CompanyUpdate};
pub use contact::{Contact, ContactRef, Contacts};
pub use event::Events;

use serde_json::Value;

use crate::error::DecodeError;

/// Look up a required member of a JSON object.
pub(crate) fn field<'v>(value: &'v Value, name: &str) -> Result<&'v Value, DecodeError> {
    value.get(name).ok_or_else(|| DecodeError::missing(name))
}

/// A required array member.
pub(crate) fn array<'v>(value: &'v Value, name: &str) -> Result<&'v Vec<Value>, DecodeError> {
    field(value, name)?
        .as_array()
        .ok_or_else(|| DecodeError::invalid(name, "an array"))
}

/// A required integer member.
pub(crate) fn integer(value: &Value, name: &str) -> Result<i64, DecodeError> {
    field(value, name)?
        .as_i64()
        .ok_or_else(|| DecodeError::invalid(name, "an integer"))
}

/// An integer member that may be absent or null.
pub(crate) fn optional_integer(value: &Value, name: &str) -> Result<Option<i64>, DecodeError> {
    match value.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| DecodeError::invalid(name, "an integer")),
    }
}

/// A required boolean member.
pub(crate) fn flag(value: &Value, name: &str) -> Result<bool, DecodeError> {
    field(value, name)?
        .as_bool()
        .ok_or_else(|| DecodeError::invalid(name, "a boolean"))
}
