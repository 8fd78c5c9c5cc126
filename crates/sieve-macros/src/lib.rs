//! Proc macros for Sieve.
//!
//! # Available Macros
//!
//! - [`Filter`] - Generate a filter descriptor and field-value extraction
//! - [`Record`] - Generate a record descriptor for projection, sort and identity
//!
//! Both read `#[sieve(...)]` attributes and build a `sieve::RecordType` once,
//! on first use. Unknown operator tags are reported at compile time.
//!
//! # Examples
//!
//! For working examples, see `sieve/tests/derive.rs`.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod attrs;
mod derive;

/// Derives `sieve::Filter` for a search-criteria struct.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `json = ".."` | API name (default: the field identifier; `"-"` for none) |
/// | `column = ".."` | Storage-column name |
/// | `doc = ".."` | Document-store field path |
/// | `op = ".."` | Operator override: `eq`, `like`, `prefix`, `suffix`, `gt`, `gte`, `lt`, `lte` (or `=`, `>=`, ...) |
/// | `keyword` / `keyword = ".."` | Include in keyword search, with an optional string match mode |
/// | `id` | Identity field, used for exclusions |
/// | `nullable` | Nullable in storage |
/// | `meta` | Reserved meta-object slot; implied for `FilterMeta` fields |
/// | `skip` | Not part of the filter |
///
/// # Struct Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `record = Type` | Record searched by this filter (must implement `sieve::Record`) |
///
/// # Generated Code
///
/// 1. Field name constants (e.g., `UserFilter::CREATED_AT == "createdAt"`)
/// 2. Implementation of `sieve::Filter`
///
/// # Example
///
/// ```ignore
/// use sieve::{Filter, FilterMeta, Int64Range, Record};
///
/// #[derive(Record)]
/// struct User {
///     #[sieve(column = "id", doc = "_id", id)]
///     id: String,
///     #[sieve(json = "createdAt", column = "created_at")]
///     created_at: i64,
/// }
///
/// #[derive(Filter, Default)]
/// #[sieve(record = User)]
/// struct UserFilter {
///     #[sieve(column = "full_name", op = "like", keyword)]
///     name: Option<String>,
///     #[sieve(column = "age")]
///     age: Option<Int64Range>,
///     meta: FilterMeta,
/// }
/// ```
#[proc_macro_derive(Filter, attributes(sieve))]
pub fn filter_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive::filter_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives `sieve::Record` for a stored record type.
///
/// Accepts the same field attributes as [`Filter`]; `op` and `keyword` are
/// recorded but only matter on filters.
#[proc_macro_derive(Record, attributes(sieve))]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive::record_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
