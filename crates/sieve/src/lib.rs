//! Sieve - Compile declarative filter structs into backend queries.
//!
//! A filter is a plain struct whose fields describe search criteria. Field
//! tags declare how each field is named in each store and how it matches;
//! the compiler walks a filter value and emits a query for one backend:
//!
//! - [`emit::MapEmitter`]: column-keyed conditions for SQL/key-value stores
//! - [`emit::DocumentEmitter`]: ordered `(path, condition)` pairs
//! - [`emit::SearchEmitter`]: search-engine operator objects
//! - [`emit::TripleEmitter`]: `(path, op, value)` triples with cursor paging
//!
//! # Quick Start
//!
//! ```rust
//! use sieve::emit::MapEmitter;
//! use sieve::{Compiler, CompilerConfig, Filter, FilterMeta, Int64Range};
//!
//! #[derive(Filter, Default)]
//! struct UserFilter {
//!     #[sieve(column = "full_name", op = "contains", keyword)]
//!     name: Option<String>,
//!     #[sieve(column = "age")]
//!     age: Option<Int64Range>,
//!     #[sieve(column = "created_at", json = "createdAt")]
//!     created_at: Option<sieve::TimeRange>,
//!     meta: FilterMeta,
//! }
//!
//! let compiler = Compiler::<MapEmitter>::for_filter::<UserFilter>(CompilerConfig::default())?;
//!
//! let filter = UserFilter {
//!     age: Some(Int64Range::at_least(18)),
//!     meta: FilterMeta::default().with_sort("-createdAt"),
//!     ..Default::default()
//! };
//! let query = compiler.compile(&filter);
//!
//! assert!(query.predicates.contains_key("age"));
//! assert_eq!(query.sort, "created_at desc");
//! # Ok::<(), sieve::ConfigError>(())
//! ```
//!
//! # Compilation Rules
//!
//! | Field value                | Predicate                              |
//! |----------------------------|----------------------------------------|
//! | `None`, `""`, `0`, `false` | none                                   |
//! | non-empty string           | prefix match, or the field's `op`      |
//! | other scalar               | equality, or the field's comparison    |
//! | range                      | one predicate per effective bound      |
//! | non-empty `Vec`            | membership                             |
//! | [`FilterMeta`]             | keyword group, exclusion, projection, sort, paging |
//!
//! All predicates combine with AND; the keyword group is a single OR over
//! the keyword-tagged fields. A filter with nothing set compiles to the
//! empty query, which matches everything.
//!
//! # Naming Schemes
//!
//! Each field may carry a JSON name, a storage-column name and a document
//! path. Each backend reads one [`Scheme`]; a field without a name in that
//! scheme is invisible to it. The JSON scheme falls back to the column name.
//!
//! # Failure
//!
//! Setup is where things fail: an unknown operator tag, a match mode the
//! backend cannot express, or a malformed schema file returns a
//! [`ConfigError`]. Once a [`Compiler`] exists, compiling never fails;
//! unresolvable sort tokens, projections and cursors are dropped and logged
//! through `tracing` at debug level.

mod catalog;
mod compile;
mod config;
mod cursor;
pub mod emit;
mod error;
mod meta;
mod op;
mod ordering;
mod range;
mod registry;
mod value;

// Re-export public API
pub use catalog::{FieldDef, FieldMatch, RecordType, RecordTypeBuilder, ResolvedNames, Scheme};
pub use compile::{
    resolve_projection, Compiler, Emitter, Filter, KeywordTerm, PageRequest, Record,
};
pub use config::{
    CompilerConfig, FieldSchema, IdentityNames, KeywordSpec, RecordSchema, SchemaFile,
    PREFIX_SENTINEL,
};
pub use cursor::Cursor;
pub use error::{ConfigError, Result};
pub use meta::FilterMeta;
pub use op::Op;
pub use ordering::{parse_sort, resolve_sort, sort_string, Dir, OrderBy};
pub use range::{
    Bound, Bounds, Int32Range, Int64Range, IntRange, NumberRange, Range, RangeBound, RangeValue,
    TimeRange,
};
pub use registry::Registry;
pub use value::{AsFieldValue, AsValue, FieldValue, Number, Scalar, Timestamp, Value};

#[cfg(feature = "derive")]
pub use sieve_macros::{Filter, Record};

/// Support items for derive-generated code. Not public API.
#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::OnceCell;

    use crate::catalog::{FieldDef, RecordType};

    /// Freezes a derive-generated declaration. The macro has already
    /// rejected unknown tags and duplicate identities.
    pub fn record_type(name: &str, fields: Vec<FieldDef>) -> RecordType {
        RecordType::from_parts(name.to_string(), fields)
    }
}
