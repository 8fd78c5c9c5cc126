//! The filter walk shared by every backend.
//!
//! [`Compiler`] walks a filter's fields in declaration order, classifies each
//! [`FieldValue`], and reports predicates to an [`Emitter`]. The emitter is
//! the only backend-specific part: it decides what shape an equality, a
//! range or a keyword group takes in its store's query language.
//!
//! ```text
//! Unset / Meta        -> skipped (Meta drives keyword, exclusion, projection, sort, paging)
//! "" / 0 / false      -> skipped
//! non-empty string    -> add_match (op override, default prefix)
//! other scalar        -> add_equals, or add_compare with a comparison override
//! range               -> add_range (1 or 2 bounds), skipped when unbounded
//! non-empty list      -> add_membership
//! ```
//!
//! Binding a compiler to an emitter validates the filter type against the
//! emitter's capabilities; after that, compilation cannot fail.

use std::marker::PhantomData;

use crate::catalog::{FieldDef, RecordType, Scheme};
use crate::config::CompilerConfig;
use crate::error::{ConfigError, Result};
use crate::meta::FilterMeta;
use crate::op::Op;
use crate::ordering::{resolve_sort, OrderBy};
use crate::range::Bounds;
use crate::value::{FieldValue, Value};

/// A struct usable as search criteria.
///
/// Usually derived with `#[derive(Filter)]`.
pub trait Filter {
    /// Descriptor of the filter struct itself (predicate names and tags).
    fn filter_type() -> &'static RecordType
    where
        Self: Sized;

    /// Descriptor of the record being searched (projection, sort, identity).
    ///
    /// Defaults to the filter's own descriptor.
    fn target_type() -> &'static RecordType
    where
        Self: Sized,
    {
        Self::filter_type()
    }

    /// Field values in declaration order, one per descriptor field.
    fn field_values(&self) -> Vec<FieldValue<'_>>;
}

/// A stored record type. Usually derived with `#[derive(Record)]`.
pub trait Record {
    fn record_type() -> &'static RecordType;
}

/// One keyword-group member: the keyword applied to a tagged field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordTerm<'a> {
    pub name: &'a str,
    pub mode: Op,
    pub text: &'a str,
}

/// Paging controls after applying configured defaults and caps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest<'a> {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub cursor: Option<&'a str>,
}

/// Backend sink receiving classified predicates.
///
/// Names passed in are already resolved under [`Emitter::SCHEME`].
pub trait Emitter: Sized {
    /// Compiled query handed to the execution layer.
    type Output;

    /// Backend name for diagnostics.
    const NAME: &'static str;

    /// Naming scheme used to key predicates.
    const SCHEME: Scheme;

    /// Whether comparison overrides on scalar fields are honored. When
    /// `false`, such fields compile to equality.
    const COMPARISONS: bool = true;

    /// Maximum number of keyword fields, or `None` when OR groups are native.
    const MAX_KEYWORD_FIELDS: Option<usize> = None;

    fn new(config: &CompilerConfig) -> Self;

    /// Whether a string match mode is expressible.
    fn supports(mode: Op) -> bool {
        mode.is_string_op()
    }

    fn add_equals(&mut self, name: &str, value: &Value<'_>);

    /// A non-empty string matched with `mode` (a string mode).
    fn add_match(&mut self, name: &str, mode: Op, text: &str);

    /// A scalar compared with `op` (a comparison).
    fn add_compare(&mut self, name: &str, op: Op, value: &Value<'_>);

    fn add_range(&mut self, name: &str, bounds: &Bounds);

    /// `values` is never empty.
    fn add_membership(&mut self, name: &str, values: &[Value<'_>]);

    /// OR-combination of the keyword over tagged fields. Never empty.
    fn add_keyword_group(&mut self, terms: &[KeywordTerm<'_>]);

    /// "Not in" on the identity field. `ids` is never empty.
    fn set_exclusion(&mut self, name: &str, ids: &[&str]);

    /// Fully resolved projection. Never empty.
    fn set_projection(&mut self, names: Vec<String>);

    /// Resolved sort. Never empty.
    fn set_sort(&mut self, orderings: Vec<OrderBy>);

    /// Paging; always called last, after `set_sort`.
    fn set_page(&mut self, page: PageRequest<'_>);

    fn finish(self) -> Self::Output;
}

/// Compiles filters of one filter type into one backend's queries.
///
/// Holds only shared references to immutable descriptors, so a compiler may
/// be shared across threads and called concurrently.
#[derive(Debug)]
pub struct Compiler<'r, E> {
    filter: &'r RecordType,
    target: &'r RecordType,
    config: CompilerConfig,
    _emitter: PhantomData<fn() -> E>,
}

impl<E> Clone for Compiler<'_, E> {
    fn clone(&self) -> Self {
        Compiler {
            filter: self.filter,
            target: self.target,
            config: self.config.clone(),
            _emitter: PhantomData,
        }
    }
}

impl<E: Emitter> Compiler<'static, E> {
    /// Binds the derived descriptors of `F`.
    pub fn for_filter<F: Filter>(config: CompilerConfig) -> Result<Self> {
        Compiler::new(F::filter_type(), F::target_type(), config)
    }
}

impl<'r, E: Emitter> Compiler<'r, E> {
    /// Binds descriptors to the emitter, rejecting tags it cannot express.
    pub fn new(filter: &'r RecordType, target: &'r RecordType, config: CompilerConfig) -> Result<Self> {
        validate::<E>(filter)?;
        Ok(Compiler {
            filter,
            target,
            config,
            _emitter: PhantomData,
        })
    }

    pub fn filter_type(&self) -> &'r RecordType {
        self.filter
    }

    pub fn target_type(&self) -> &'r RecordType {
        self.target
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles a filter value.
    pub fn compile<F: Filter>(&self, filter: &F) -> E::Output {
        self.compile_values(&filter.field_values())
    }

    /// Compiles raw field values laid out like the filter descriptor.
    pub fn compile_values(&self, values: &[FieldValue<'_>]) -> E::Output {
        if values.len() != self.filter.len() {
            tracing::debug!(
                record = self.filter.name(),
                expected = self.filter.len(),
                actual = values.len(),
                "field value count differs from descriptor; extra entries ignored"
            );
        }

        let mut sink = E::new(&self.config);
        let meta = self.find_meta(values);

        for (field, value) in self.filter.fields().iter().zip(values) {
            classify(&mut sink, field, value);
        }

        if let Some(meta) = meta {
            self.apply_meta(&mut sink, meta);
        }

        let page = PageRequest {
            limit: self.config.effective_limit(meta.and_then(|m| m.limit)),
            offset: meta.and_then(|m| m.offset).filter(|o| *o > 0),
            cursor: meta
                .and_then(|m| m.cursor.as_deref())
                .map(str::trim)
                .filter(|c| !c.is_empty()),
        };
        sink.set_page(page);

        sink.finish()
    }

    /// The first meta-object in declaration order; later ones are ignored.
    fn find_meta<'v>(&self, values: &[FieldValue<'v>]) -> Option<&'v FilterMeta> {
        let mut metas = values.iter().filter_map(|v| match v {
            FieldValue::Meta(meta) => Some(*meta),
            _ => None,
        });
        let first = metas.next();
        let ignored = metas.count();
        if ignored > 0 {
            tracing::debug!(
                record = self.filter.name(),
                ignored,
                "filter has several meta-objects; using the first"
            );
        }
        first
    }

    fn apply_meta(&self, sink: &mut E, meta: &FilterMeta) {
        if let Some(keyword) = meta.keyword() {
            let terms: Vec<KeywordTerm<'_>> = self
                .filter
                .keyword_fields()
                .filter_map(|(field, mode)| {
                    field.name(E::SCHEME).map(|name| KeywordTerm {
                        name,
                        mode,
                        text: keyword,
                    })
                })
                .collect();
            if terms.is_empty() {
                tracing::debug!(
                    record = self.filter.name(),
                    backend = E::NAME,
                    "keyword dropped: no keyword fields"
                );
            } else {
                sink.add_keyword_group(&terms);
            }
        }

        let excluded = meta.excluded_ids();
        if !excluded.is_empty() {
            sink.set_exclusion(self.identity_name(), &excluded);
        }

        if !meta.fields.is_empty() {
            if let Some(projection) = resolve_projection(self.target, &meta.fields, E::SCHEME) {
                sink.set_projection(projection);
            }
        }

        let sort = resolve_sort(self.target, &meta.sort, E::SCHEME);
        if !sort.is_empty() {
            sink.set_sort(sort);
        }
    }

    fn identity_name(&self) -> &str {
        self.target
            .identity()
            .and_then(|field| field.name(E::SCHEME))
            .unwrap_or_else(|| self.config.identity.name(E::SCHEME))
    }
}

/// Resolves requested JSON names into `scheme` names, all or nothing.
///
/// Returns `None` if any name fails to resolve, meaning "no explicit
/// projection". The result keeps request order.
pub fn resolve_projection(record: &RecordType, requested: &[String], scheme: Scheme) -> Option<Vec<String>> {
    let mut resolved = Vec::with_capacity(requested.len());
    for name in requested {
        match record.lookup(name.trim(), scheme) {
            Some(found) => resolved.push(found.name.to_string()),
            None => {
                tracing::debug!(
                    record = record.name(),
                    field = name.as_str(),
                    scheme = scheme.as_str(),
                    "projection dropped: unresolved field"
                );
                return None;
            }
        }
    }
    Some(resolved)
}

fn classify<E: Emitter>(sink: &mut E, field: &FieldDef, value: &FieldValue<'_>) {
    if field.is_meta() || matches!(value, FieldValue::Unset | FieldValue::Meta(_)) {
        return;
    }

    let Some(name) = field.name(E::SCHEME) else {
        tracing::trace!(field = field.ident(), backend = E::NAME, "no external name; skipped");
        return;
    };

    match value {
        FieldValue::Scalar(Value::String(text)) => {
            if text.is_empty() {
                return;
            }
            let mode = field.op_override().unwrap_or(Op::Prefix);
            if mode.is_comparison() {
                let value = Value::String(text);
                if E::COMPARISONS {
                    sink.add_compare(name, mode, &value);
                } else {
                    sink.add_equals(name, &value);
                }
            } else {
                sink.add_match(name, mode, text);
            }
        }
        FieldValue::Scalar(scalar) => {
            if scalar.is_zero() {
                return;
            }
            match field.op_override() {
                Some(op) if op.is_comparison() && E::COMPARISONS => {
                    sink.add_compare(name, op, scalar)
                }
                _ => sink.add_equals(name, scalar),
            }
        }
        FieldValue::Range(range) => match range.bounds() {
            Some(bounds) => sink.add_range(name, &bounds),
            None => tracing::trace!(field = field.ident(), kind = range.kind(), "unbounded range; skipped"),
        },
        FieldValue::List(items) => {
            let items: Vec<Value<'_>> = items.iter().filter(|v| !v.is_none()).cloned().collect();
            if !items.is_empty() {
                sink.add_membership(name, &items);
            }
        }
        FieldValue::Unset | FieldValue::Meta(_) => {}
    }
}

fn validate<E: Emitter>(filter: &RecordType) -> Result<()> {
    for field in filter.fields() {
        if field.name(E::SCHEME).is_none() {
            continue;
        }
        if let Some(op) = field.op_override() {
            if op.is_string_op() && !E::supports(op) {
                return Err(unsupported::<E>(field, op));
            }
        }
        if let Some(mode) = field.keyword_mode() {
            if !mode.is_string_op() || !E::supports(mode) {
                return Err(unsupported::<E>(field, mode));
            }
        }
    }

    if let Some(max) = E::MAX_KEYWORD_FIELDS {
        let count = filter
            .keyword_fields()
            .filter(|(field, _)| field.name(E::SCHEME).is_some())
            .count();
        if count > max {
            return Err(ConfigError::UnsupportedKeywordGroup {
                record: filter.name().to_string(),
                count,
                backend: E::NAME,
            });
        }
    }
    Ok(())
}

fn unsupported<E: Emitter>(field: &FieldDef, op: Op) -> ConfigError {
    ConfigError::UnsupportedMode {
        field: field.ident().to_string(),
        op: op.as_str(),
        backend: E::NAME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldDef;
    use crate::range::{Int64Range, RangeValue};
    use crate::value::Number;

    /// Records every sink call as a line of text.
    #[derive(Debug, Default)]
    struct Trace(Vec<String>);

    impl Emitter for Trace {
        type Output = Vec<String>;
        const NAME: &'static str = "trace";
        const SCHEME: Scheme = Scheme::Json;

        fn new(_: &CompilerConfig) -> Self {
            Trace::default()
        }

        fn add_equals(&mut self, name: &str, value: &Value<'_>) {
            self.0.push(format!("{name} = {}", value.to_json()));
        }

        fn add_match(&mut self, name: &str, mode: Op, text: &str) {
            self.0.push(format!("{name} {mode} {text}"));
        }

        fn add_compare(&mut self, name: &str, op: Op, value: &Value<'_>) {
            self.0.push(format!("{name} {} {}", op.symbol(), value.to_json()));
        }

        fn add_range(&mut self, name: &str, bounds: &Bounds) {
            for b in bounds.iter() {
                self.0.push(format!("{name} {} {}", b.op.symbol(), b.value.to_json()));
            }
        }

        fn add_membership(&mut self, name: &str, values: &[Value<'_>]) {
            self.0.push(format!("{name} in {}", values.len()));
        }

        fn add_keyword_group(&mut self, terms: &[KeywordTerm<'_>]) {
            let parts: Vec<String> = terms
                .iter()
                .map(|t| format!("{} {} {}", t.name, t.mode, t.text))
                .collect();
            self.0.push(format!("any({})", parts.join(" | ")));
        }

        fn set_exclusion(&mut self, name: &str, ids: &[&str]) {
            self.0.push(format!("{name} not in {}", ids.join(",")));
        }

        fn set_projection(&mut self, names: Vec<String>) {
            self.0.push(format!("fields {}", names.join(",")));
        }

        fn set_sort(&mut self, orderings: Vec<OrderBy>) {
            self.0.push(format!("sort {}", crate::ordering::sort_string(&orderings)));
        }

        fn set_page(&mut self, page: PageRequest<'_>) {
            if page.limit.is_some() || page.offset.is_some() {
                self.0.push(format!("page {:?} {:?}", page.limit, page.offset));
            }
        }

        fn finish(self) -> Vec<String> {
            self.0
        }
    }

    fn people() -> RecordType {
        RecordType::builder("PersonFilter")
            .field(FieldDef::new("id").json("id").identity())
            .field(FieldDef::new("name").json("name").keyword(Op::Contains))
            .field(FieldDef::new("status").json("status").op(Op::Eq))
            .field(FieldDef::new("age").json("age"))
            .field(FieldDef::new("score").json("score").op(Op::Gte))
            .field(FieldDef::new("hidden"))
            .field(FieldDef::new("meta").meta())
            .build()
            .unwrap()
    }

    fn unpaged() -> CompilerConfig {
        CompilerConfig {
            default_limit: None,
            ..CompilerConfig::default()
        }
    }

    fn compile(values: &[FieldValue<'_>]) -> Vec<String> {
        let ty = people();
        let compiler = Compiler::<Trace>::new(&ty, &ty, unpaged()).unwrap();
        compiler.compile_values(values)
    }

    #[test]
    fn default_filter_matches_everything() {
        let values = vec![FieldValue::Unset; 7];
        assert!(compile(&values).is_empty());
    }

    #[test]
    fn classification() {
        let meta = FilterMeta::default();
        let values = vec![
            FieldValue::Unset,
            FieldValue::Scalar(Value::String("al")),
            FieldValue::Scalar(Value::String("active")),
            FieldValue::Range(RangeValue::Int64(Int64Range::at_least(18))),
            FieldValue::Scalar(Value::Number(Number::I64(7))),
            FieldValue::Scalar(Value::String("ignored: no external name")),
            FieldValue::Meta(&meta),
        ];
        assert_eq!(
            compile(&values),
            vec![
                "name prefix al",
                "status eq active",
                "age >= 18",
                "score >= 7",
            ]
        );
    }

    #[test]
    fn zero_scalars_are_unset() {
        let values = vec![
            FieldValue::Scalar(Value::Number(Number::I64(0))),
            FieldValue::Scalar(Value::String("")),
            FieldValue::Scalar(Value::Bool(false)),
            FieldValue::Range(RangeValue::Int64(Int64Range::default())),
            FieldValue::List(vec![]),
            FieldValue::Unset,
            FieldValue::Unset,
        ];
        assert!(compile(&values).is_empty());
    }

    #[test]
    fn keyword_group_and_meta() {
        let meta = FilterMeta::default()
            .with_q(" bo ")
            .with_sort("-age,bogus")
            .with_fields(["name", "age"])
            .excluding(["x1"]);
        let mut values = vec![FieldValue::Unset; 6];
        values.push(FieldValue::Meta(&meta));
        assert_eq!(
            compile(&values),
            vec![
                "any(name contains bo)",
                "id not in x1",
                "fields name,age",
                "sort age desc",
            ]
        );
    }

    #[test]
    fn first_meta_wins() {
        let first = FilterMeta::default().with_sort("name");
        let second = FilterMeta::default().with_sort("-age");
        let values = vec![
            FieldValue::Meta(&first),
            FieldValue::Unset,
            FieldValue::Unset,
            FieldValue::Unset,
            FieldValue::Unset,
            FieldValue::Unset,
            FieldValue::Meta(&second),
        ];
        assert_eq!(compile(&values), vec!["sort name asc"]);
    }

    #[test]
    fn projection_is_all_or_nothing() {
        let ty = people();
        assert_eq!(
            resolve_projection(&ty, &["name".into(), "age".into()], Scheme::Json),
            Some(vec!["name".to_string(), "age".to_string()])
        );
        assert_eq!(
            resolve_projection(&ty, &["name".into(), "nope".into()], Scheme::Json),
            None
        );
    }

    #[test]
    fn paging_uses_config_caps() {
        let ty = people();
        let config = CompilerConfig {
            max_limit: Some(50),
            ..unpaged()
        };
        let compiler = Compiler::<Trace>::new(&ty, &ty, config).unwrap();
        let meta = FilterMeta::default().with_page(500, 10);
        let mut values = vec![FieldValue::Unset; 6];
        values.push(FieldValue::Meta(&meta));
        assert_eq!(compiler.compile_values(&values), vec!["page Some(50) Some(10)"]);
    }

    #[test]
    fn keyword_mode_must_be_string_mode() {
        let ty = RecordType::builder("Bad")
            .field(FieldDef::new("n").json("n").keyword(Op::Gt))
            .build()
            .unwrap();
        let err = Compiler::<Trace>::new(&ty, &ty, CompilerConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedMode { op: "gt", .. }));
    }
}
