//! Endpoint path templates and query parameters.

use serde_json::{Map, Value};
use url::Url;

/// Ordered caller parameters, kept with their JSON types.
///
/// Keys may repeat (`property=email&property=firstname`); [`set`](Self::set)
/// replaces every earlier value for a key while [`append`](Self::append) adds
/// another one. Arrays expand to repeated keys only when rendered as a query
/// string; [`to_json`](Self::to_json) keeps them as given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(Vec<(String, Value)>);

impl QueryParams {
    /// Create an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`append`](Self::append).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.append(key, value);
        self
    }

    /// Add a value for `key`, keeping existing ones.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.push((key.into(), value.into()));
    }

    /// Replace all values for `key` with a single value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        self.0.retain(|(k, _)| *k != key);
        self.0.push((key, value.into()));
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten into query string pairs.
    ///
    /// Arrays become one pair per element and nulls are dropped. Strings are
    /// sent bare; other values in their JSON text form.
    pub fn query_pairs(&self) -> Vec<(&str, String)> {
        let mut pairs = Vec::with_capacity(self.0.len());
        for (key, value) in &self.0 {
            match value {
                Value::Array(values) => {
                    let texts = values.iter().filter_map(query_text);
                    pairs.extend(texts.map(|text| (key.as_str(), text)));
                }
                other => {
                    if let Some(text) = query_text(other) {
                        pairs.push((key.as_str(), text));
                    }
                }
            }
        }
        pairs
    }

    /// Render as a JSON object for endpoints that take options in the body.
    ///
    /// Values keep their types. A key given once maps to its value as given;
    /// repeated keys collect into an array.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (key, value) in &self.0 {
            match object.get_mut(key) {
                Some(Value::Array(values)) => match value {
                    Value::Array(more) => values.extend(more.iter().cloned()),
                    single => values.push(single.clone()),
                },
                Some(existing) => {
                    let first = existing.take();
                    let mut values = vec![first];
                    match value {
                        Value::Array(more) => values.extend(more.iter().cloned()),
                        single => values.push(single.clone()),
                    }
                    *existing = Value::Array(values);
                }
                None => {
                    object.insert(key.clone(), value.clone());
                }
            }
        }
        Value::Object(object)
    }
}

fn query_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.append(k, v);
        }
        params
    }
}

/// A request target: a path template plus its substitutions and query.
///
/// Templates are absolute paths whose segments may be `:name` placeholders.
///
/// ```
/// use hubspot_core::Endpoint;
/// use url::Url;
///
/// let base = Url::parse("https://api.hubapi.com").unwrap();
/// let url = Endpoint::new("/contacts/v1/contact/email/:email/profile")
///     .param("email", "a b@example.com")
///     .url(&base);
/// assert_eq!(
///     url.as_str(),
///     "https://api.hubapi.com/contacts/v1/contact/email/a%20b@example.com/profile"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Endpoint {
    template: &'static str,
    params: Vec<(&'static str, String)>,
    query: QueryParams,
}

impl Endpoint {
    pub fn new(template: &'static str) -> Self {
        Self {
            template,
            params: Vec::new(),
            query: QueryParams::new(),
        }
    }

    /// Supply the value for the `:name` placeholder.
    pub fn param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.params.push((name, value.to_string()));
        self
    }

    /// Set a query parameter, replacing earlier values for the key.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.set(key, value.to_string());
        self
    }

    /// Set a query parameter when a value is present.
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Append caller-supplied parameters.
    pub fn extend_query(mut self, params: &QueryParams) -> Self {
        for (k, v) in params.iter() {
            self.query.append(k, v.clone());
        }
        self
    }

    pub fn template(&self) -> &'static str {
        self.template
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.query
    }

    /// Resolve the template against `base`.
    ///
    /// Placeholder values are percent-encoded as single path segments.
    ///
    /// # Panics
    ///
    /// Panics when a placeholder has no value. Templates and their parameters
    /// are fixed by the resource clients, so this is a programming error.
    pub fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_query(None);

        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            for segment in self.template.trim_start_matches('/').split('/') {
                match segment.strip_prefix(':') {
                    Some(name) => {
                        segments.push(self.lookup(name));
                    }
                    None => {
                        segments.push(segment);
                    }
                }
            }
        }

        let query = self.query.query_pairs();
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &query {
                pairs.append_pair(k, v);
            }
        }

        url
    }

    fn lookup(&self, name: &str) -> &str {
        match self.params.iter().rev().find(|(n, _)| *n == name) {
            Some((_, value)) => value,
            None => panic!(
                "unresolved placeholder ':{}' in endpoint template '{}'",
                name, self.template
            ),
        }
    }
}
