//! The embedded search-control object.
//!
//! Any filter may embed one [`FilterMeta`] field. It never becomes a
//! predicate itself; instead it carries the cross-cutting controls that apply
//! to the whole query: free-text keyword, projection, sort, exclusions and
//! paging.

use serde::{Deserialize, Serialize};

/// Cross-cutting search controls.
///
/// Decodes from the usual query-string/JSON spellings:
///
/// ```
/// use sieve::FilterMeta;
///
/// let meta: FilterMeta = serde_json::from_str(
///     r#"{"q": " foo ", "fields": ["name"], "sort": "-createdAt", "excluding": ["a1"]}"#,
/// ).unwrap();
/// assert_eq!(meta.keyword(), Some("foo"));
/// assert_eq!(meta.fields, vec!["name".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterMeta {
    /// Free-text keyword applied across keyword-tagged fields.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub q: String,
    /// Requested projection, by JSON name. All-or-nothing.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    /// Sort expression: `field`, `+field` or `-field`, comma separated.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sort: String,
    /// Identifiers to omit from the result.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluding: Vec<String>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Rows to skip before the page starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Continuation token from a previous page (triple backend).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl FilterMeta {
    /// The trimmed keyword, or `None` if blank.
    pub fn keyword(&self) -> Option<&str> {
        let q = self.q.trim();
        if q.is_empty() {
            None
        } else {
            Some(q)
        }
    }

    /// Excluded identifiers with blanks removed, in request order.
    pub fn excluded_ids(&self) -> Vec<&str> {
        self.excluding
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// Builder-style keyword setter.
    pub fn with_q(mut self, q: impl Into<String>) -> Self {
        self.q = q.into();
        self
    }

    /// Builder-style sort setter.
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    /// Builder-style projection setter.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style exclusion setter.
    pub fn excluding<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluding = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style paging setter.
    pub fn with_page(mut self, limit: u64, offset: u64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Builder-style cursor setter.
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}
