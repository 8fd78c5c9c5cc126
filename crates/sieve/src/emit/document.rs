//! Document-store output: an ordered list of `(path, condition)` pairs.
//!
//! Pairs stay a list rather than a map so one path may carry several
//! conditions (e.g. both bounds of a range), the way ordered BSON documents
//! do.

use serde::Serialize;
use serde_json::{json, Map, Value as Json};

use crate::catalog::Scheme;
use crate::compile::{Emitter, KeywordTerm, PageRequest};
use crate::config::CompilerConfig;
use crate::op::Op;
use crate::ordering::OrderBy;
use crate::range::Bounds;
use crate::value::Value;

use super::regex_pattern;

/// Compiled document query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentQuery {
    /// AND-combined `(path, condition)` pairs.
    pub filter: Vec<(String, Json)>,
    /// `{path: 1, ...}`, or empty for whole documents.
    pub projection: Map<String, Json>,
    /// `(path, 1 | -1)` pairs.
    pub sort: Vec<(String, i32)>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl DocumentQuery {
    /// The filter as a single document, `{}` when unfiltered.
    ///
    /// Pairs are wrapped in `$and` so repeated paths survive.
    pub fn filter_document(&self) -> Json {
        if self.filter.is_empty() {
            return Json::Object(Map::new());
        }
        let clauses: Vec<Json> = self
            .filter
            .iter()
            .map(|(path, condition)| {
                let mut clause = Map::new();
                clause.insert(path.clone(), condition.clone());
                Json::Object(clause)
            })
            .collect();
        json!({ "$and": clauses })
    }
}

fn string_condition(mode: Op, text: &str) -> Json {
    match mode {
        Op::Eq => Json::String(text.to_string()),
        _ => json!({ "$regex": regex_pattern(mode, text) }),
    }
}

/// Emitter for [`DocumentQuery`].
#[derive(Debug, Default)]
pub struct DocumentEmitter {
    query: DocumentQuery,
}

impl DocumentEmitter {
    fn push(&mut self, path: &str, condition: Json) {
        tracing::trace!(path, %condition, "document predicate");
        self.query.filter.push((path.to_string(), condition));
    }
}

impl Emitter for DocumentEmitter {
    type Output = DocumentQuery;
    const NAME: &'static str = "document";
    const SCHEME: Scheme = Scheme::Document;

    fn new(_config: &CompilerConfig) -> Self {
        DocumentEmitter::default()
    }

    fn add_equals(&mut self, name: &str, value: &Value<'_>) {
        self.push(name, value.to_json());
    }

    fn add_match(&mut self, name: &str, mode: Op, text: &str) {
        self.push(name, string_condition(mode, text));
    }

    fn add_compare(&mut self, name: &str, op: Op, value: &Value<'_>) {
        let mut condition = Map::new();
        condition.insert(op.mongo_key().to_string(), value.to_json());
        self.push(name, Json::Object(condition));
    }

    fn add_range(&mut self, name: &str, bounds: &Bounds) {
        for bound in bounds.iter() {
            self.add_compare(name, bound.op, &bound.value);
        }
    }

    fn add_membership(&mut self, name: &str, values: &[Value<'_>]) {
        let values: Vec<Json> = values.iter().map(Value::to_json).collect();
        self.push(name, json!({ "$in": values }));
    }

    fn add_keyword_group(&mut self, terms: &[KeywordTerm<'_>]) {
        let alternatives: Vec<Json> = terms
            .iter()
            .map(|t| {
                let mut clause = Map::new();
                clause.insert(t.name.to_string(), string_condition(t.mode, t.text));
                Json::Object(clause)
            })
            .collect();
        self.push("$or", Json::Array(alternatives));
    }

    fn set_exclusion(&mut self, name: &str, ids: &[&str]) {
        self.push(name, json!({ "$nin": ids }));
    }

    fn set_projection(&mut self, names: Vec<String>) {
        self.query.projection = names.into_iter().map(|n| (n, json!(1))).collect();
    }

    fn set_sort(&mut self, orderings: Vec<OrderBy>) {
        self.query.sort = orderings
            .into_iter()
            .map(|o| (o.field, o.dir.signum()))
            .collect();
    }

    fn set_page(&mut self, page: PageRequest<'_>) {
        if page.cursor.is_some() {
            tracing::debug!("document emitter pages by skip; cursor ignored");
        }
        self.query.skip = page.offset;
        self.query.limit = page.limit;
    }

    fn finish(self) -> DocumentQuery {
        self.query
    }
}
