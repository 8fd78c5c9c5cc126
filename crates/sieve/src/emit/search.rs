//! Search-engine output keyed by JSON (API) names.
//!
//! Every path maps to one operator object. Conditions on the same path merge
//! into that object; an operator that is already present goes to a
//! top-level `$and` list instead of overwriting it.

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

/// Compiled search-engine query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchQuery {
    pub filter: Map<String, Json>,
    /// `[{"path": "asc" | "desc"}, ...]`
    pub sort: Vec<Json>,
    /// Requested source fields; empty returns whole documents.
    #[serde(rename = "_source")]
    pub source: Vec<String>,
    pub from: Option<u64>,
    pub size: Option<u64>,
}

impl SearchQuery {
    /// The full request body, omitting unset parts.
    pub fn to_body(&self) -> Json {
        let mut body = Map::new();
        body.insert("filter".into(), Json::Object(self.filter.clone()));
        if !self.sort.is_empty() {
            body.insert("sort".into(), Json::Array(self.sort.clone()));
        }
        if !self.source.is_empty() {
            body.insert("_source".into(), json!(self.source));
        }
        if let Some(from) = self.from {
            body.insert("from".into(), json!(from));
        }
        if let Some(size) = self.size {
            body.insert("size".into(), json!(size));
        }
        Json::Object(body)
    }
}

fn string_operator(mode: Op, text: &str) -> (&'static str, Json) {
    match mode {
        Op::Eq => ("$eq", Json::String(text.to_string())),
        _ => ("$regex", Json::String(regex_pattern(mode, text))),
    }
}

/// Emitter for [`SearchQuery`].
#[derive(Debug, Default)]
pub struct SearchEmitter {
    query: SearchQuery,
}

impl SearchEmitter {
    fn merge(&mut self, path: &str, operator: &str, operand: Json) {
        tracing::trace!(path, operator, %operand, "search predicate");
        let filter = &mut self.query.filter;
        let conflict = match filter.get_mut(path) {
            Some(Json::Object(ops)) if !ops.contains_key(operator) => {
                ops.insert(operator.to_string(), operand);
                return;
            }
            Some(_) => true,
            None => false,
        };
        if conflict {
            let mut ops = Map::new();
            ops.insert(operator.to_string(), operand);
            let mut clause = Map::new();
            clause.insert(path.to_string(), Json::Object(ops));
            match filter
                .entry("$and")
                .or_insert_with(|| Json::Array(Vec::new()))
            {
                Json::Array(list) => list.push(Json::Object(clause)),
                other => *other = Json::Array(vec![Json::Object(clause)]),
            }
        } else {
            let mut ops = Map::new();
            ops.insert(operator.to_string(), operand);
            filter.insert(path.to_string(), Json::Object(ops));
        }
    }
}

impl Emitter for SearchEmitter {
    type Output = SearchQuery;
    const NAME: &'static str = "search";
    const SCHEME: Scheme = Scheme::Json;

    fn new(_config: &CompilerConfig) -> Self {
        SearchEmitter::default()
    }

    fn add_equals(&mut self, name: &str, value: &Value<'_>) {
        self.merge(name, "$eq", value.to_json());
    }

    fn add_match(&mut self, name: &str, mode: Op, text: &str) {
        let (operator, operand) = string_operator(mode, text);
        self.merge(name, operator, operand);
    }

    fn add_compare(&mut self, name: &str, op: Op, value: &Value<'_>) {
        self.merge(name, op.mongo_key(), value.to_json());
    }

    fn add_range(&mut self, name: &str, bounds: &Bounds) {
        for bound in bounds.iter() {
            self.merge(name, bound.op.mongo_key(), bound.value.to_json());
        }
    }

    fn add_membership(&mut self, name: &str, values: &[Value<'_>]) {
        let values: Vec<Json> = values.iter().map(Value::to_json).collect();
        self.merge(name, "$in", Json::Array(values));
    }

    fn add_keyword_group(&mut self, terms: &[KeywordTerm<'_>]) {
        let alternatives: Vec<Json> = terms
            .iter()
            .map(|t| {
                let (operator, operand) = string_operator(t.mode, t.text);
                let mut ops = Map::new();
                ops.insert(operator.to_string(), operand);
                let mut clause = Map::new();
                clause.insert(t.name.to_string(), Json::Object(ops));
                Json::Object(clause)
            })
            .collect();
        self.query.filter.insert("$or".into(), Json::Array(alternatives));
    }

    fn set_exclusion(&mut self, name: &str, ids: &[&str]) {
        self.merge(name, "$nin", json!(ids));
    }

    fn set_projection(&mut self, names: Vec<String>) {
        self.query.source = names;
    }

    fn set_sort(&mut self, orderings: Vec<OrderBy>) {
        self.query.sort = orderings
            .into_iter()
            .map(|o| {
                let mut entry = Map::new();
                entry.insert(o.field, Json::String(o.dir.as_str().to_string()));
                Json::Object(entry)
            })
            .collect();
    }

    fn set_page(&mut self, page: PageRequest<'_>) {
        if page.cursor.is_some() {
            tracing::debug!("search emitter pages by from/size; cursor ignored");
        }
        self.query.from = page.offset;
        self.query.size = page.limit;
    }

    fn finish(self) -> SearchQuery {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::{NumberRange, RangeValue};
    use crate::value::Number;

    #[test]
    fn range_bounds_merge_into_one_object() {
        let mut e = SearchEmitter::default();
        let bounds = RangeValue::from(NumberRange {
            min: Some(1.5),
            top: Some(9.0),
            ..Default::default()
        })
        .bounds()
        .unwrap();
        e.add_range("price", &bounds);
        let q = e.finish();
        assert_eq!(q.filter["price"], json!({"$gte": 1.5, "$lt": 9.0}));
    }

    #[test]
    fn exclusion_merges_with_existing_path() {
        let mut e = SearchEmitter::default();
        e.add_membership("id", &[Value::String("a"), Value::String("b")]);
        e.set_exclusion("id", &["c"]);
        let q = e.finish();
        assert_eq!(q.filter["id"], json!({"$in": ["a", "b"], "$nin": ["c"]}));
    }

    #[test]
    fn repeated_operator_goes_to_and() {
        let mut e = SearchEmitter::default();
        e.add_equals("n", &Value::Number(Number::I64(1)));
        e.add_equals("n", &Value::Number(Number::I64(2)));
        let q = e.finish();
        assert_eq!(q.filter["n"], json!({"$eq": 1}));
        assert_eq!(q.filter["$and"], json!([{"n": {"$eq": 2}}]));
    }

    #[test]
    fn body_omits_unset_parts() {
        let mut e = SearchEmitter::default();
        e.add_match("name", Op::Prefix, "jo");
        e.set_sort(vec![OrderBy::desc("createdAt")]);
        e.set_page(PageRequest {
            limit: Some(10),
            ..Default::default()
        });
        assert_eq!(
            e.finish().to_body(),
            json!({
                "filter": {"name": {"$regex": "^jo"}},
                "sort": [{"createdAt": "desc"}],
                "size": 10
            })
        );
    }
}
