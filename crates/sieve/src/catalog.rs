//! Record type descriptors and external-name resolution.
//!
//! A [`RecordType`] is the static description of a struct: its fields in
//! declaration order, each with its external name under every naming
//! [`Scheme`] plus the tag directives that steer compilation (operator
//! override, keyword participation, identity, nullability).
//!
//! Descriptors are built once and never mutated. `#[derive(Filter)]` and
//! `#[derive(Record)]` generate them at compile time; [`RecordType::builder`]
//! and [`crate::config::SchemaFile`] build them at runtime.

use crate::error::{ConfigError, Result};
use crate::op::Op;

/// Naming scheme of an external field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// API / JSON name. Falls back to the column name when undeclared.
    Json,
    /// Relational storage-column name.
    Column,
    /// Document-store field path.
    Document,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Json => "json",
            Scheme::Column => "column",
            Scheme::Document => "document",
        }
    }
}

/// One declared field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    ident: String,
    json: Option<String>,
    column: Option<String>,
    document: Option<String>,
    op: Option<Op>,
    keyword: Option<Op>,
    identity: bool,
    nullable: bool,
    meta: bool,
}

impl FieldDef {
    /// Creates a field with no external names.
    pub fn new(ident: impl Into<String>) -> Self {
        FieldDef {
            ident: ident.into(),
            json: None,
            column: None,
            document: None,
            op: None,
            keyword: None,
            identity: false,
            nullable: false,
            meta: false,
        }
    }

    /// Sets the JSON name. `"-"` and `""` mean "no JSON name".
    pub fn json(mut self, name: impl Into<String>) -> Self {
        self.json = declared(name.into());
        self
    }

    /// Sets the storage-column name.
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.column = declared(name.into());
        self
    }

    /// Sets the document-field path.
    pub fn document(mut self, name: impl Into<String>) -> Self {
        self.document = declared(name.into());
        self
    }

    /// Sets the operator override.
    pub fn op(mut self, op: Op) -> Self {
        self.op = Some(op);
        self
    }

    /// Sets the operator override from a tag string.
    pub fn op_tag(self, tag: &str) -> Result<Self> {
        let op = parse_tag(&self.ident, tag)?;
        Ok(self.op(op))
    }

    /// Marks the field as a keyword-search target using `mode`.
    pub fn keyword(mut self, mode: Op) -> Self {
        self.keyword = Some(mode);
        self
    }

    /// Marks the field as a keyword-search target from a tag string.
    ///
    /// An empty tag uses the field's operator override, or prefix matching.
    pub fn keyword_tag(self, tag: &str) -> Result<Self> {
        if tag.trim().is_empty() {
            let mode = self.op.filter(|op| op.is_string_op()).unwrap_or(Op::Prefix);
            return Ok(self.keyword(mode));
        }
        let mode = parse_tag(&self.ident, tag)?;
        Ok(self.keyword(mode))
    }

    /// Marks the field as the record's identity.
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    /// Marks the field as nullable in storage.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Marks the field as the reserved meta-object slot.
    ///
    /// A meta field carries query controls, not record data: it has no
    /// external name under any scheme, so sort and projection never see it.
    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// The declared Rust identifier.
    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn op_override(&self) -> Option<Op> {
        self.op
    }

    pub fn keyword_mode(&self) -> Option<Op> {
        self.keyword
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_meta(&self) -> bool {
        self.meta
    }

    /// External name under `scheme`, or `None` if the field is invisible there.
    ///
    /// The JSON scheme falls back to the column name; the other schemes never
    /// fall back. Meta fields have no name under any scheme.
    pub fn name(&self, scheme: Scheme) -> Option<&str> {
        if self.meta {
            return None;
        }
        match scheme {
            Scheme::Json => self.json.as_deref().or(self.column.as_deref()),
            Scheme::Column => self.column.as_deref(),
            Scheme::Document => self.document.as_deref(),
        }
    }

    /// Names under all schemes at once.
    pub fn names(&self) -> ResolvedNames<'_> {
        ResolvedNames {
            json: self.name(Scheme::Json),
            storage: self.name(Scheme::Column),
            document: self.name(Scheme::Document),
        }
    }
}

fn declared(name: String) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "-" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_tag(field: &str, tag: &str) -> Result<Op> {
    Op::from_tag(tag).ok_or_else(|| ConfigError::UnknownOperator {
        field: field.to_string(),
        tag: tag.to_string(),
    })
}

/// A field's names under every scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedNames<'a> {
    pub json: Option<&'a str>,
    pub storage: Option<&'a str>,
    pub document: Option<&'a str>,
}

/// Result of an external-name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMatch<'a> {
    /// Declaration index.
    pub index: usize,
    /// Declared Rust identifier.
    pub ident: &'a str,
    /// Name under the requested target scheme.
    pub name: &'a str,
}

/// Immutable description of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordType {
    name: String,
    fields: Vec<FieldDef>,
    identity: Option<usize>,
}

impl RecordType {
    /// Starts a runtime declaration.
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&FieldDef> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of the field at `index` under every scheme.
    pub fn resolve(&self, index: usize) -> Option<ResolvedNames<'_>> {
        self.fields.get(index).map(FieldDef::names)
    }

    /// External name of the field at `index` under `scheme`.
    pub fn external_name(&self, index: usize, scheme: Scheme) -> Option<&str> {
        self.fields.get(index).and_then(|f| f.name(scheme))
    }

    /// Finds the field whose `from` name is `name` and returns its `to` name.
    ///
    /// Serves both directions the emitters need, e.g. JSON to column for
    /// projections and column to JSON for result shaping. Returns `None` if
    /// no field matches or the match has no `to` name.
    pub fn translate(&self, name: &str, from: Scheme, to: Scheme) -> Option<FieldMatch<'_>> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.name(from) == Some(name))
            .and_then(|(index, f)| {
                f.name(to).map(|target| FieldMatch {
                    index,
                    ident: &f.ident,
                    name: target,
                })
            })
    }

    /// Resolves a caller-supplied field reference to its `to` name.
    ///
    /// References are JSON names; the declared identifier is accepted as a
    /// fallback.
    pub fn lookup(&self, reference: &str, to: Scheme) -> Option<FieldMatch<'_>> {
        if let Some(found) = self.translate(reference, Scheme::Json, to) {
            return Some(found);
        }
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| !f.meta && f.ident == reference)
            .and_then(|(index, f)| {
                f.name(to).map(|target| FieldMatch {
                    index,
                    ident: &f.ident,
                    name: target,
                })
            })
    }

    /// The field marked as identity, if any.
    pub fn identity(&self) -> Option<&FieldDef> {
        self.identity.and_then(|i| self.fields.get(i))
    }

    /// Fields participating in keyword search, with their match mode.
    pub fn keyword_fields(&self) -> impl Iterator<Item = (&FieldDef, Op)> {
        self.fields
            .iter()
            .filter_map(|f| f.keyword.map(|mode| (f, mode)))
    }

    pub(crate) fn from_parts(name: String, fields: Vec<FieldDef>) -> Self {
        let identity = fields.iter().position(|f| f.identity);
        RecordType {
            name,
            fields,
            identity,
        }
    }
}

/// Runtime builder for [`RecordType`].
#[derive(Debug, Clone)]
pub struct RecordTypeBuilder {
    name: String,
    fields: Vec<FieldDef>,
}

impl RecordTypeBuilder {
    /// Appends a field. Declaration order is preserved.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Validates and freezes the declaration.
    pub fn build(self) -> Result<RecordType> {
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.ident == field.ident) {
                return Err(ConfigError::DuplicateField {
                    record: self.name,
                    field: field.ident.clone(),
                });
            }
        }

        let mut ids = self.fields.iter().filter(|f| f.identity);
        if let (Some(first), Some(second)) = (ids.next(), ids.next()) {
            return Err(ConfigError::DuplicateIdentity {
                record: self.name.clone(),
                first: first.ident.clone(),
                second: second.ident.clone(),
            });
        }

        Ok(RecordType::from_parts(self.name, self.fields))
    }
}
