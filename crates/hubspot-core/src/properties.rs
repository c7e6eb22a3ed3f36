//! Property bag marshalling.
//!
//! The API exchanges custom fields as a list of `{name, value}` records
//! (or, in most read responses, as an object keyed by property name). Records
//! in this crate hold them as a flat [`Properties`] map.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// In-memory property map. Keys iterate in sorted order.
pub type Properties = BTreeMap<String, Value>;

/// Key field used by company property records.
pub const NAME_KEY: &str = "name";

/// Key field used by contact property records.
pub const PROPERTY_KEY: &str = "property";

/// Decode a wire property bag into a [`Properties`] map.
///
/// Accepts either the array form `[{"<key_field>": k, "value": v}, ..]` or the
/// object form `{"k": {"value": v, ..}}`. Metadata such as timestamps and
/// versions is dropped. Duplicate names resolve last-seen-wins. Absent or
/// unrecognised input decodes to an empty map.
pub fn decode(wire: Option<&Value>, key_field: &str) -> Properties {
    let mut properties = Properties::new();

    match wire {
        Some(Value::Array(records)) => {
            for record in records {
                let Some(key) = record.get(key_field).and_then(Value::as_str) else {
                    continue;
                };
                let value = record.get("value").cloned().unwrap_or(Value::Null);
                properties.insert(key.to_string(), value);
            }
        }
        Some(Value::Object(members)) => {
            for (key, member) in members {
                let value = member.get("value").cloned().unwrap_or(Value::Null);
                properties.insert(key.clone(), value);
            }
        }
        _ => {}
    }

    properties
}

/// Encode a [`Properties`] map as a wire property bag.
///
/// Values pass through unconverted. Reserved identifier keys must be removed
/// by the caller first.
pub fn encode(properties: &Properties, key_field: &str) -> Vec<Value> {
    properties
        .iter()
        .map(|(key, value)| {
            let mut record = Map::with_capacity(2);
            record.insert(key_field.to_string(), Value::String(key.clone()));
            record.insert("value".to_string(), value.clone());
            Value::Object(record)
        })
        .collect()
}

/// Build a [`Properties`] map from key/value pairs.
///
/// ```
/// use hubspot_core::properties::{self, Properties};
///
/// let props: Properties = properties::from_pairs([("email", "a@example.com")]);
/// assert_eq!(props["email"], "a@example.com");
/// ```
pub fn from_pairs<K, V, I>(pairs: I) -> Properties
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
