//! Request header map.

use std::collections::BTreeMap;

/// Signing timestamp attribute.
pub const TIMESTAMP: &str = "timestamp";
/// API name attribute.
pub const API_NAME: &str = "api-name";
/// API version attribute.
pub const API_VERSION: &str = "api-version";
/// Calling channel attribute.
pub const CHANNEL: &str = "channel";
/// Calling user attribute.
pub const USER_ID: &str = "user-id";
/// Lists the attribute headers covered by the signature.
pub const SIGNED_HEADERS: &str = "x-signed-headers";
/// Carries the signature.
pub const AUTHORIZATION: &str = "Authorization";
/// Correlation id propagated between services.
pub const CORRELATION_ID: &str = "x-correlation-id";
/// Name of the calling system.
pub const SYSTEM_PEER: &str = "x-system-peer";

/// Case-insensitive header map.
///
/// Names are stored lower-cased; iteration is in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: BTreeMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Set `name`, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.entries.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Builder-style [`Headers::set`].
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.set(k.as_ref(), v);
        }
        headers
    }
}
