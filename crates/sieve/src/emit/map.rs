//! Generic map output for relational and key-value stores.
//!
//! Predicates are keyed by storage-column name. The downstream SQL stage
//! turns each [`Condition`] into a `WHERE` fragment; [`MapQuery::to_where`]
//! renders the common placeholder form.

use indexmap::IndexMap;
use serde::Serialize;

use crate::catalog::Scheme;
use crate::compile::{Emitter, KeywordTerm, PageRequest};
use crate::config::CompilerConfig;
use crate::op::Op;
use crate::ordering::{sort_string, OrderBy};
use crate::range::Bounds;
use crate::value::{Scalar, Value};

/// Condition on a single column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Eq(Scalar),
    /// A `LIKE` pattern with `%`, `_` and `\` in the literal escaped.
    Like(String),
    /// One or two interval bounds.
    Range(Vec<(Op, Scalar)>),
    In(Vec<Scalar>),
    NotIn(Vec<Scalar>),
    /// Several conditions on one column, all required.
    All(Vec<Condition>),
}

impl Condition {
    fn merge(self, other: Condition) -> Condition {
        match self {
            Condition::All(mut all) => {
                all.push(other);
                Condition::All(all)
            }
            first => Condition::All(vec![first, other]),
        }
    }

    fn render(&self, column: &str, clauses: &mut Vec<String>, params: &mut Vec<Scalar>) {
        match self {
            Condition::Eq(v) => {
                clauses.push(format!("{column} = ?"));
                params.push(v.clone());
            }
            Condition::Like(pattern) => {
                clauses.push(format!("{column} LIKE ? ESCAPE '\\'"));
                params.push(Scalar::String(pattern.clone()));
            }
            Condition::Range(bounds) => {
                for (op, v) in bounds {
                    clauses.push(format!("{column} {} ?", op.symbol()));
                    params.push(v.clone());
                }
            }
            Condition::In(values) | Condition::NotIn(values) => {
                let keyword = if matches!(self, Condition::In(_)) { "IN" } else { "NOT IN" };
                let marks = vec!["?"; values.len()].join(", ");
                clauses.push(format!("{column} {keyword} ({marks})"));
                params.extend(values.iter().cloned());
            }
            Condition::All(all) => {
                for c in all {
                    c.render(column, clauses, params);
                }
            }
        }
    }
}

/// Paging window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Page {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Compiled map query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapQuery {
    /// AND-combined conditions, in field declaration order.
    pub predicates: IndexMap<String, Condition>,
    /// OR-combined keyword conditions. Empty means no keyword group.
    pub any_of: Vec<(String, Condition)>,
    /// `"column dir,column dir"`, or empty for backend order.
    pub sort: String,
    /// Comma-joined projection, or empty for all columns.
    pub fields: String,
    pub page: Page,
}

impl MapQuery {
    /// `true` when the query matches every row.
    pub fn is_unfiltered(&self) -> bool {
        self.predicates.is_empty() && self.any_of.is_empty()
    }

    /// Renders the predicates as a `?`-placeholder `WHERE` body.
    ///
    /// Returns an empty string for an unfiltered query.
    pub fn to_where(&self) -> (String, Vec<Scalar>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        for (column, condition) in &self.predicates {
            condition.render(column, &mut clauses, &mut params);
        }
        if !self.any_of.is_empty() {
            let mut alternatives = Vec::new();
            for (column, condition) in &self.any_of {
                let mut inner = Vec::new();
                condition.render(column, &mut inner, &mut params);
                alternatives.push(inner.join(" AND "));
            }
            clauses.push(format!("({})", alternatives.join(" OR ")));
        }
        (clauses.join(" AND "), params)
    }
}

/// Escapes `LIKE` metacharacters and wraps the literal by mode.
pub fn like_pattern(mode: Op, text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    match mode {
        Op::Prefix => format!("{escaped}%"),
        Op::Suffix => format!("%{escaped}"),
        Op::Eq => escaped,
        _ => format!("%{escaped}%"),
    }
}

fn scalar(value: &Value<'_>) -> Option<Scalar> {
    value.to_scalar()
}

fn string_condition(mode: Op, text: &str) -> Condition {
    match mode {
        Op::Eq => Condition::Eq(Scalar::String(text.to_string())),
        _ => Condition::Like(like_pattern(mode, text)),
    }
}

/// Emitter for [`MapQuery`]. Supports equality only for non-string scalars.
#[derive(Debug, Default)]
pub struct MapEmitter {
    query: MapQuery,
}

impl MapEmitter {
    fn insert(&mut self, column: &str, condition: Condition) {
        tracing::trace!(column, ?condition, "map predicate");
        match self.query.predicates.get_mut(column) {
            Some(existing) => {
                let first = std::mem::replace(existing, Condition::All(Vec::new()));
                *existing = first.merge(condition);
            }
            None => {
                self.query.predicates.insert(column.to_string(), condition);
            }
        }
    }
}

impl Emitter for MapEmitter {
    type Output = MapQuery;
    const NAME: &'static str = "map";
    const SCHEME: Scheme = Scheme::Column;
    const COMPARISONS: bool = false;

    fn new(_config: &CompilerConfig) -> Self {
        MapEmitter::default()
    }

    fn add_equals(&mut self, name: &str, value: &Value<'_>) {
        if let Some(v) = scalar(value) {
            self.insert(name, Condition::Eq(v));
        }
    }

    fn add_match(&mut self, name: &str, mode: Op, text: &str) {
        self.insert(name, string_condition(mode, text));
    }

    fn add_compare(&mut self, name: &str, _op: Op, value: &Value<'_>) {
        self.add_equals(name, value);
    }

    fn add_range(&mut self, name: &str, bounds: &Bounds) {
        let parts: Vec<(Op, Scalar)> = bounds
            .iter()
            .filter_map(|b| scalar(&b.value).map(|v| (b.op, v)))
            .collect();
        if !parts.is_empty() {
            self.insert(name, Condition::Range(parts));
        }
    }

    fn add_membership(&mut self, name: &str, values: &[Value<'_>]) {
        self.insert(name, Condition::In(values.iter().filter_map(scalar).collect()));
    }

    fn add_keyword_group(&mut self, terms: &[KeywordTerm<'_>]) {
        self.query.any_of = terms
            .iter()
            .map(|t| (t.name.to_string(), string_condition(t.mode, t.text)))
            .collect();
    }

    fn set_exclusion(&mut self, name: &str, ids: &[&str]) {
        let ids = ids.iter().map(|id| Scalar::String((*id).to_string())).collect();
        self.insert(name, Condition::NotIn(ids));
    }

    fn set_projection(&mut self, names: Vec<String>) {
        self.query.fields = names.join(",");
    }

    fn set_sort(&mut self, orderings: Vec<OrderBy>) {
        self.query.sort = sort_string(&orderings);
    }

    fn set_page(&mut self, page: PageRequest<'_>) {
        if page.cursor.is_some() {
            tracing::debug!("map emitter pages by offset; cursor ignored");
        }
        self.query.page = Page {
            limit: page.limit,
            offset: page.offset,
        };
    }

    fn finish(self) -> MapQuery {
        self.query
    }
}
