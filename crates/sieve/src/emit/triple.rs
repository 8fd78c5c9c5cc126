//! Triple-list output for Firestore-like stores.
//!
//! These stores take `(path, op, value)` conditions, have no substring or
//! suffix operators and no OR combinator, and page with a `start_after`
//! cursor. Prefix matching is expressed as a half-open string range.

use std::fmt;

use serde::Serialize;
use serde_json::Value as Json;

use crate::catalog::Scheme;
use crate::compile::{Emitter, KeywordTerm, PageRequest};
use crate::config::CompilerConfig;
use crate::cursor::Cursor;
use crate::op::Op;
use crate::ordering::OrderBy;
use crate::range::Bounds;
use crate::value::Value;

/// Triple operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TripleOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not-in")]
    NotIn,
}

impl TripleOp {
    pub fn as_str(self) -> &'static str {
        match self {
            TripleOp::Eq => "==",
            TripleOp::Lt => "<",
            TripleOp::Lte => "<=",
            TripleOp::Gt => ">",
            TripleOp::Gte => ">=",
            TripleOp::In => "in",
            TripleOp::NotIn => "not-in",
        }
    }

    fn from_comparison(op: Op) -> TripleOp {
        match op {
            Op::Gt => TripleOp::Gt,
            Op::Gte => TripleOp::Gte,
            Op::Lt => TripleOp::Lt,
            Op::Lte => TripleOp::Lte,
            _ => TripleOp::Eq,
        }
    }
}

impl fmt::Display for TripleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(path, op, value)` condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Triple {
    pub path: String,
    pub op: TripleOp,
    pub value: Json,
}

impl Triple {
    pub fn new(path: impl Into<String>, op: TripleOp, value: Json) -> Self {
        Triple {
            path: path.into(),
            op,
            value,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.path, self.op, self.value)
    }
}

/// Compiled triple query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TripleQuery {
    /// AND-combined conditions.
    pub triples: Vec<Triple>,
    /// Selected fields; empty selects whole documents.
    pub fields: Vec<String>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Sort-key values of the last row of the previous page.
    pub start_after: Option<Vec<Json>>,
}

/// Emitter for [`TripleQuery`]. Rejects contains/suffix modes and more than
/// one keyword field at setup.
#[derive(Debug)]
pub struct TripleEmitter {
    query: TripleQuery,
    sentinel: char,
}

impl TripleEmitter {
    fn push(&mut self, path: &str, op: TripleOp, value: Json) {
        tracing::trace!(path, op = op.as_str(), %value, "triple predicate");
        self.query.triples.push(Triple::new(path, op, value));
    }

    fn push_string(&mut self, path: &str, mode: Op, text: &str) {
        match mode {
            Op::Prefix => {
                let upper = format!("{text}{}", self.sentinel);
                self.push(path, TripleOp::Gte, Json::String(text.to_string()));
                self.push(path, TripleOp::Lt, Json::String(upper));
            }
            _ => self.push(path, TripleOp::Eq, Json::String(text.to_string())),
        }
    }
}

impl Emitter for TripleEmitter {
    type Output = TripleQuery;
    const NAME: &'static str = "triple";
    const SCHEME: Scheme = Scheme::Document;
    const MAX_KEYWORD_FIELDS: Option<usize> = Some(1);

    fn new(config: &CompilerConfig) -> Self {
        TripleEmitter {
            query: TripleQuery::default(),
            sentinel: config.prefix_sentinel,
        }
    }

    fn supports(mode: Op) -> bool {
        matches!(mode, Op::Eq | Op::Prefix)
    }

    fn add_equals(&mut self, name: &str, value: &Value<'_>) {
        self.push(name, TripleOp::Eq, value.to_json());
    }

    fn add_match(&mut self, name: &str, mode: Op, text: &str) {
        self.push_string(name, mode, text);
    }

    fn add_compare(&mut self, name: &str, op: Op, value: &Value<'_>) {
        self.push(name, TripleOp::from_comparison(op), value.to_json());
    }

    fn add_range(&mut self, name: &str, bounds: &Bounds) {
        for bound in bounds.iter() {
            self.push(name, TripleOp::from_comparison(bound.op), bound.value.to_json());
        }
    }

    fn add_membership(&mut self, name: &str, values: &[Value<'_>]) {
        let values: Vec<Json> = values.iter().map(Value::to_json).collect();
        self.push(name, TripleOp::In, Json::Array(values));
    }

    fn add_keyword_group(&mut self, terms: &[KeywordTerm<'_>]) {
        // setup validation caps the group at one term
        for term in terms {
            self.push_string(term.name, term.mode, term.text);
        }
    }

    fn set_exclusion(&mut self, name: &str, ids: &[&str]) {
        let ids: Vec<Json> = ids.iter().map(|id| Json::String((*id).to_string())).collect();
        self.push(name, TripleOp::NotIn, Json::Array(ids));
    }

    fn set_projection(&mut self, names: Vec<String>) {
        self.query.fields = names;
    }

    fn set_sort(&mut self, orderings: Vec<OrderBy>) {
        self.query.order_by = orderings;
    }

    fn set_page(&mut self, page: PageRequest<'_>) {
        self.query.limit = page.limit;
        self.query.offset = page.offset;
        let Some(token) = page.cursor else {
            return;
        };
        match Cursor::decode(token) {
            Some(cursor) if !cursor.is_empty() && cursor.len() == self.query.order_by.len() => {
                self.query.start_after = Some(cursor.into_values());
            }
            Some(cursor) => {
                tracing::debug!(
                    cursor_len = cursor.len(),
                    sort_len = self.query.order_by.len(),
                    "cursor arity does not match sort; starting from the beginning"
                );
            }
            None => {
                tracing::debug!("undecodable cursor; starting from the beginning");
            }
        }
    }

    fn finish(self) -> TripleQuery {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn emitter() -> TripleEmitter {
        TripleEmitter::new(&CompilerConfig::default())
    }

    #[test]
    fn prefix_is_half_open_range() {
        let mut e = emitter();
        e.add_match("name", Op::Prefix, "ab");
        let q = e.finish();
        assert_eq!(
            q.triples,
            vec![
                Triple::new("name", TripleOp::Gte, json!("ab")),
                Triple::new("name", TripleOp::Lt, json!("ab\u{f8ff}")),
            ]
        );
    }

    #[test]
    fn capabilities() {
        assert!(TripleEmitter::supports(Op::Eq));
        assert!(TripleEmitter::supports(Op::Prefix));
        assert!(!TripleEmitter::supports(Op::Contains));
        assert!(!TripleEmitter::supports(Op::Suffix));
    }

    #[test]
    fn cursor_must_match_sort_arity() {
        let token = Cursor::new(vec![json!("2024-01-01T00:00:00.000Z")]).encode();

        let mut e = emitter();
        e.set_sort(vec![OrderBy::desc("createdAt")]);
        e.set_page(PageRequest {
            limit: Some(10),
            offset: None,
            cursor: Some(&token),
        });
        let q = e.finish();
        assert_eq!(q.start_after, Some(vec![json!("2024-01-01T00:00:00.000Z")]));
        assert_eq!(q.limit, Some(10));

        let mut e = emitter();
        e.set_page(PageRequest {
            cursor: Some(&token),
            ..Default::default()
        });
        assert_eq!(e.finish().start_after, None);
    }

    #[test]
    fn garbage_cursor_dropped() {
        let mut e = emitter();
        e.set_sort(vec![OrderBy::asc("n")]);
        e.set_page(PageRequest {
            cursor: Some("not a cursor"),
            ..Default::default()
        });
        assert_eq!(e.finish().start_after, None);
    }

    #[test]
    fn serializes_symbolic_ops() {
        let t = Triple::new("tags", TripleOp::NotIn, json!(["a"]));
        assert_eq!(
            serde_json::to_value(&t).unwrap(),
            json!({"path": "tags", "op": "not-in", "value": ["a"]})
        );
        assert_eq!(t.to_string(), r#"tags not-in ["a"]"#);
    }
}
