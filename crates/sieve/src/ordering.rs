//! Sort directions and the sort-expression resolver.
//!
//! A sort expression is a comma-separated list of field references, each
//! optionally prefixed with `-` (descending) or `+` (ascending):
//!
//! ```text
//! -createdAt, name, +score
//! ```
//!
//! [`resolve_sort`] maps each reference through a [`RecordType`] to the
//! backend's naming scheme and silently drops tokens that do not resolve.

use std::fmt;

use serde::Serialize;

use crate::catalog::{RecordType, Scheme};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// `1` for ascending, `-1` for descending (document-store convention).
    pub fn signum(self) -> i32 {
        match self {
            Dir::Asc => 1,
            Dir::Desc => -1,
        }
    }

    /// Returns the keyword of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single ordering clause: a backend field name and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    /// Backend-native field name.
    pub field: String,
    /// The sort direction.
    pub dir: Dir,
}

impl OrderBy {
    /// Creates a new ascending ordering for the given field.
    pub fn asc(field: impl Into<String>) -> Self {
        OrderBy {
            field: field.into(),
            dir: Dir::Asc,
        }
    }

    /// Creates a new descending ordering for the given field.
    pub fn desc(field: impl Into<String>) -> Self {
        OrderBy {
            field: field.into(),
            dir: Dir::Desc,
        }
    }

    /// Creates a new ordering with the given direction.
    pub fn new(field: impl Into<String>, dir: Dir) -> Self {
        OrderBy {
            field: field.into(),
            dir,
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.dir)
    }
}

/// Splits a sort expression into `(direction, reference)` tokens.
///
/// Whitespace around tokens is trimmed; empty tokens and bare signs are
/// skipped.
pub fn parse_sort(expr: &str) -> Vec<(Dir, &str)> {
    expr.split(',')
        .filter_map(|token| {
            let token = token.trim();
            let (dir, reference) = if let Some(rest) = token.strip_prefix('-') {
                (Dir::Desc, rest)
            } else if let Some(rest) = token.strip_prefix('+') {
                (Dir::Asc, rest)
            } else {
                (Dir::Asc, token)
            };
            let reference = reference.trim();
            if reference.is_empty() {
                None
            } else {
                Some((dir, reference))
            }
        })
        .collect()
}

/// Resolves a sort expression against `record` into `scheme` names.
///
/// Tokens that do not resolve are dropped. An expression where nothing
/// resolves yields an empty list, meaning "backend default order".
pub fn resolve_sort(record: &RecordType, expr: &str, scheme: Scheme) -> Vec<OrderBy> {
    parse_sort(expr)
        .into_iter()
        .filter_map(|(dir, reference)| match record.lookup(reference, scheme) {
            Some(found) => Some(OrderBy::new(found.name, dir)),
            None => {
                tracing::debug!(
                    record = record.name(),
                    token = reference,
                    scheme = scheme.as_str(),
                    "dropping unresolved sort token"
                );
                None
            }
        })
        .collect()
}

/// Renders orderings as `"name dir,name dir"`. Empty input gives `""`.
pub fn sort_string(orderings: &[OrderBy]) -> String {
    orderings
        .iter()
        .map(OrderBy::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldDef;

    fn record() -> RecordType {
        RecordType::builder("Post")
            .field(FieldDef::new("created_at").json("createdAt").column("created_at"))
            .field(FieldDef::new("name").json("name").column("name"))
            .field(FieldDef::new("score").json("score").column("score"))
            .build()
            .unwrap()
    }

    #[test]
    fn direction_helpers() {
        assert_eq!(Dir::Asc.signum(), 1);
        assert_eq!(Dir::Desc.signum(), -1);
        assert_eq!(Dir::default(), Dir::Asc);
        assert_eq!(OrderBy::desc("a").to_string(), "a desc");
    }

    #[test]
    fn parse_prefixes() {
        assert_eq!(
            parse_sort("-createdAt, name ,+score"),
            vec![
                (Dir::Desc, "createdAt"),
                (Dir::Asc, "name"),
                (Dir::Asc, "score")
            ]
        );
    }

    #[test]
    fn parse_skips_empty_tokens() {
        assert!(parse_sort("").is_empty());
        assert!(parse_sort(" , -, +").is_empty());
        assert_eq!(parse_sort("a,,b"), vec![(Dir::Asc, "a"), (Dir::Asc, "b")]);
    }

    #[test]
    fn resolves_to_column_names() {
        let sort = resolve_sort(&record(), "-createdAt,name", Scheme::Column);
        assert_eq!(sort_string(&sort), "created_at desc,name asc");
    }

    #[test]
    fn unresolved_tokens_dropped() {
        let sort = resolve_sort(&record(), "bogus,-score", Scheme::Column);
        assert_eq!(sort, vec![OrderBy::desc("score")]);
    }

    #[test]
    fn all_unresolved_is_empty() {
        let sort = resolve_sort(&record(), "x,-y", Scheme::Column);
        assert!(sort.is_empty());
        assert_eq!(sort_string(&sort), "");
    }

    #[test]
    fn scheme_without_names_drops_everything() {
        assert!(resolve_sort(&record(), "name", Scheme::Document).is_empty());
    }
}
