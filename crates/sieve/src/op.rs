//! Match modes and comparison operators.
//!
//! The [`Op`] enum is the closed vocabulary behind the `op = "..."` and
//! `keyword = "..."` field tags. String modes decide how a text value is
//! matched; comparison modes override plain equality on scalar fields and
//! double as the bound operators of range predicates.

use std::fmt;

use serde::Serialize;

/// Match mode or comparison operator attached to a field declaration.
///
/// Operators are grouped by the values they apply to:
/// - **String modes**: `Eq`, `Contains`, `Prefix`, `Suffix`
/// - **Comparisons**: `Gt`, `Gte`, `Lt`, `Lte`
///
/// `Eq` belongs to both groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    /// Exact equality.
    Eq,
    /// Substring match.
    Contains,
    /// Starts-with match. The default mode for string fields.
    Prefix,
    /// Ends-with match.
    Suffix,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
}

impl Op {
    /// Every operator, in declaration order.
    pub const ALL: [Op; 8] = [
        Op::Eq,
        Op::Contains,
        Op::Prefix,
        Op::Suffix,
        Op::Gt,
        Op::Gte,
        Op::Lt,
        Op::Lte,
    ];

    /// Parses a tag value from the field-tag vocabulary.
    ///
    /// Accepts the symbolic and word spellings (`"="`, `"eq"`, `"like"`,
    /// `">="`, `"gte"`, ...). Matching is case-insensitive and ignores
    /// surrounding whitespace. Returns `None` for anything else; callers turn
    /// that into a setup-time configuration error.
    pub fn from_tag(tag: &str) -> Option<Op> {
        let tag = tag.trim().to_ascii_lowercase();
        let op = match tag.as_str() {
            "=" | "==" | "eq" | "equal" | "equals" | "exact" => Op::Eq,
            "like" | "contains" | "substring" => Op::Contains,
            "prefix" | "startswith" | "starts_with" => Op::Prefix,
            "suffix" | "endswith" | "ends_with" => Op::Suffix,
            ">" | "gt" => Op::Gt,
            ">=" | "gte" => Op::Gte,
            "<" | "lt" => Op::Lt,
            "<=" | "lte" => Op::Lte,
            _ => return None,
        };
        Some(op)
    }

    /// Returns `true` if this operator is a valid match mode for text.
    pub fn is_string_op(self) -> bool {
        matches!(self, Op::Eq | Op::Contains | Op::Prefix | Op::Suffix)
    }

    /// Returns `true` for the relational operators.
    pub fn is_comparison(self) -> bool {
        matches!(self, Op::Gt | Op::Gte | Op::Lt | Op::Lte)
    }

    /// The relational symbol (`=`, `>=`, ...) for equality and comparisons.
    ///
    /// String modes other than `Eq` have no symbol and render as their name.
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            other => other.as_str(),
        }
    }

    /// The Mongo-style operator key (`$eq`, `$gte`, ...).
    ///
    /// Pattern modes all map to `$regex`.
    pub fn mongo_key(self) -> &'static str {
        match self {
            Op::Eq => "$eq",
            Op::Gt => "$gt",
            Op::Gte => "$gte",
            Op::Lt => "$lt",
            Op::Lte => "$lte",
            Op::Contains | Op::Prefix | Op::Suffix => "$regex",
        }
    }

    /// Returns the display name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Contains => "contains",
            Op::Prefix => "prefix",
            Op::Suffix => "suffix",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::Lt => "lt",
            Op::Lte => "lte",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
