//! Redacting wrapper for the API credential.
//!
//! The clinical API authenticates with a static `x-api-key` header. The key
//! is read from configuration or the environment and held in a
//! [`SecretString`] so that it cannot leak through `{:?}` in a tracing
//! field, through `Display`, or through a serialized run report.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const REDACTED: &str = "[REDACTED]";

/// A credential that renders as `[REDACTED]` everywhere except [`expose`](Self::expose).
///
/// Deserializes from a plain JSON string so it can sit directly in the
/// config file. Serializes to an empty string.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value. Only the request builder should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `true` when no value is set, or the value is only whitespace.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("SecretString(<unset>)")
        } else {
            write!(f, "SecretString({REDACTED})")
        }
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("<unset>")
        } else {
            f.write_str(REDACTED)
        }
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SecretString)
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}
