//! Opaque continuation tokens.
//!
//! A cursor is the list of sort-key values of the last row of a page,
//! serialized as a JSON array and encoded as unpadded URL-safe base64 so it
//! can travel in a query string.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::Value as Json;

/// Sort-key values to resume after.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cursor {
    values: Vec<Json>,
}

impl Cursor {
    pub fn new(values: Vec<Json>) -> Self {
        Cursor { values }
    }

    /// Builds a cursor from a result row, taking `keys` in sort order.
    ///
    /// Missing keys become `null`.
    pub fn from_row(row: &serde_json::Map<String, Json>, keys: &[&str]) -> Self {
        Cursor {
            values: keys
                .iter()
                .map(|k| row.get(*k).cloned().unwrap_or(Json::Null))
                .collect(),
        }
    }

    pub fn values(&self) -> &[Json] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Json> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encodes into a URL-safe token.
    pub fn encode(&self) -> String {
        let json = Json::Array(self.values.clone()).to_string();
        URL_SAFE_NO_PAD.encode(json.as_bytes())
    }

    /// Decodes a token, or `None` if it is not a valid cursor.
    pub fn decode(token: &str) -> Option<Self> {
        let bytes = match URL_SAFE_NO_PAD.decode(token.trim()) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!(error = %err, "cursor is not valid base64");
                return None;
            }
        };
        match serde_json::from_slice::<Vec<Json>>(&bytes) {
            Ok(values) => Some(Cursor { values }),
            Err(err) => {
                tracing::debug!(error = %err, "cursor payload is not a JSON array");
                None
            }
        }
    }
}
