//! Raw ingested records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One item exactly as received from a feed source.
///
/// The payload is an arbitrarily nested JSON tree. Lookups are total: a
/// missing key, an index into a non-mapping, or an explicit `null` all read
/// as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Value);

impl RawRecord {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Parse a record from one line of newline-delimited JSON.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if the line is not JSON.
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line).map(Self)
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Resolve a nested mapping path. `null` leaves resolve to `None`.
    #[must_use]
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let mut current = &self.0;
        for segment in path {
            current = current.as_object()?.get(*segment)?;
        }
        if current.is_null() {
            None
        } else {
            Some(current)
        }
    }

    #[must_use]
    pub fn get_str(&self, path: &[&str]) -> Option<&str> {
        self.get_path(path).and_then(Value::as_str)
    }

    /// Declared language tag (`lang`), if any.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.get_str(&["lang"])
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
