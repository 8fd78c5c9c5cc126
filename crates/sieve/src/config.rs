//! Compiler configuration and runtime schema files.
//!
//! Both load from YAML or JSON:
//!
//! ```yaml
//! compiler:
//!   default_limit: 20
//!   max_limit: 500
//! records:
//!   - name: User
//!     fields:
//!       - name: id
//!         column: id
//!         doc: _id
//!         id: true
//!       - name: name
//!         column: full_name
//!         keyword: contains
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{FieldDef, RecordType, Scheme};
use crate::error::Result;
use crate::registry::Registry;

/// Code point appended to a prefix to form its exclusive upper bound.
pub const PREFIX_SENTINEL: char = '\u{f8ff}';

/// Settings shared by every compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Page size used when the request names none. `None` means unpaged.
    pub default_limit: Option<u64>,
    /// Upper cap on any page size. `None` means uncapped.
    pub max_limit: Option<u64>,
    /// Identity names used for exclusions when the record declares none.
    pub identity: IdentityNames,
    /// See [`PREFIX_SENTINEL`].
    pub prefix_sentinel: char,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            default_limit: Some(20),
            max_limit: Some(1000),
            identity: IdentityNames::default(),
            prefix_sentinel: PREFIX_SENTINEL,
        }
    }
}

impl CompilerConfig {
    pub fn from_yaml(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Applies the default and the cap to a requested page size.
    ///
    /// A request of `0` counts as no request.
    pub fn effective_limit(&self, requested: Option<u64>) -> Option<u64> {
        let limit = requested.filter(|l| *l > 0).or(self.default_limit)?;
        Some(match self.max_limit {
            Some(max) => limit.min(max),
            None => limit,
        })
    }
}

/// Fallback identity field name per naming scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityNames {
    pub json: String,
    pub column: String,
    pub document: String,
}

impl Default for IdentityNames {
    fn default() -> Self {
        IdentityNames {
            json: "id".into(),
            column: "id".into(),
            document: "_id".into(),
        }
    }
}

impl IdentityNames {
    pub fn name(&self, scheme: Scheme) -> &str {
        match scheme {
            Scheme::Json => &self.json,
            Scheme::Column => &self.column,
            Scheme::Document => &self.document,
        }
    }
}

/// A configuration document: compiler settings plus record declarations.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchemaFile {
    pub compiler: CompilerConfig,
    pub records: Vec<RecordSchema>,
}

impl SchemaFile {
    pub fn from_yaml(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Builds every declared record type and stores it in `registry`.
    ///
    /// Fails on the first invalid declaration; types registered before the
    /// failure stay registered.
    pub fn register(&self, registry: &Registry) -> Result<Vec<Arc<RecordType>>> {
        self.records
            .iter()
            .map(|record| registry.get_or_insert_with(&record.name, || record.to_record_type()))
            .collect()
    }
}

/// One declared record type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordSchema {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl RecordSchema {
    pub fn to_record_type(&self) -> Result<RecordType> {
        let mut builder = RecordType::builder(&self.name);
        for field in &self.fields {
            builder = builder.field(field.to_field_def()?);
        }
        builder.build()
    }
}

/// One declared field. Mirrors the `#[sieve(...)]` attribute vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldSchema {
    /// Field identifier. Also the JSON name unless `json` says otherwise.
    pub name: String,
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default, alias = "document")]
    pub doc: Option<String>,
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default)]
    pub keyword: Option<KeywordSpec>,
    #[serde(default)]
    pub id: bool,
    #[serde(default)]
    pub nullable: bool,
    /// Reserved meta-object slot; never a record field.
    #[serde(default)]
    pub meta: bool,
}

/// `keyword: true` or `keyword: <mode>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum KeywordSpec {
    Flag(bool),
    Mode(String),
}

impl FieldSchema {
    pub fn to_field_def(&self) -> Result<FieldDef> {
        let mut def = FieldDef::new(&self.name).json(self.json.as_deref().unwrap_or(&self.name));
        if let Some(column) = &self.column {
            def = def.column(column);
        }
        if let Some(doc) = &self.doc {
            def = def.document(doc);
        }
        if let Some(op) = &self.op {
            def = def.op_tag(op)?;
        }
        match &self.keyword {
            Some(KeywordSpec::Flag(true)) => def = def.keyword_tag("")?,
            Some(KeywordSpec::Mode(mode)) => def = def.keyword_tag(mode)?,
            Some(KeywordSpec::Flag(false)) | None => {}
        }
        if self.id {
            def = def.identity();
        }
        if self.nullable {
            def = def.nullable();
        }
        if self.meta {
            def = def.meta();
        }
        Ok(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::op::Op;

    const SCHEMA: &str = r#"
compiler:
  default_limit: 25
  identity:
    document: uid
records:
  - name: User
    fields:
      - name: id
        column: id
        doc: _id
        id: true
      - name: name
        column: full_name
        keyword: contains
      - name: email
        json: "-"
        column: email
        keyword: true
"#;

    #[test]
    fn defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.default_limit, Some(20));
        assert_eq!(config.max_limit, Some(1000));
        assert_eq!(config.identity.name(Scheme::Document), "_id");
        assert_eq!(config.prefix_sentinel, '\u{f8ff}');
    }

    #[test]
    fn effective_limit_caps() {
        let config = CompilerConfig {
            default_limit: Some(20),
            max_limit: Some(100),
            ..CompilerConfig::default()
        };
        assert_eq!(config.effective_limit(None), Some(20));
        assert_eq!(config.effective_limit(Some(0)), Some(20));
        assert_eq!(config.effective_limit(Some(50)), Some(50));
        assert_eq!(config.effective_limit(Some(5000)), Some(100));
        let unpaged = CompilerConfig {
            default_limit: None,
            ..CompilerConfig::default()
        };
        assert_eq!(unpaged.effective_limit(None), None);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = CompilerConfig::from_json(r#"{"max_limit": 10}"#).unwrap();
        assert_eq!(config.max_limit, Some(10));
        assert_eq!(config.identity, IdentityNames::default());
    }

    #[test]
    fn schema_file_loads() {
        let file = SchemaFile::from_yaml(SCHEMA).unwrap();
        assert_eq!(file.compiler.default_limit, Some(25));
        assert_eq!(file.compiler.identity.document, "uid");
        assert_eq!(file.compiler.identity.column, "id");

        let user = file.records[0].to_record_type().unwrap();
        assert_eq!(user.identity().unwrap().ident(), "id");
        assert_eq!(user.external_name(1, Scheme::Json), Some("name"));
        assert_eq!(user.external_name(1, Scheme::Column), Some("full_name"));
        assert_eq!(user.external_name(2, Scheme::Json), Some("email"));

        let kw: Vec<Op> = user.keyword_fields().map(|(_, mode)| mode).collect();
        assert_eq!(kw, vec![Op::Contains, Op::Prefix]);
    }

    #[test]
    fn meta_flag_hides_field() {
        let file = SchemaFile::from_yaml(
            r#"
records:
  - name: PostFilter
    fields:
      - name: title
      - name: meta
        meta: true
"#,
        )
        .unwrap();
        let ty = file.records[0].to_record_type().unwrap();
        assert!(ty.fields()[1].is_meta());
        assert!(ty.lookup("meta", Scheme::Json).is_none());
        assert_eq!(ty.external_name(0, Scheme::Json), Some("title"));
    }

    #[test]
    fn register_into_registry() {
        let registry = Registry::new();
        let types = SchemaFile::from_yaml(SCHEMA).unwrap().register(&registry).unwrap();
        assert_eq!(types.len(), 1);
        assert!(registry.get("User").is_some());
    }

    #[test]
    fn bad_operator_is_an_error() {
        let file = SchemaFile::from_yaml(
            "records:\n  - name: T\n    fields:\n      - name: a\n        op: '~~'\n",
        )
        .unwrap();
        let err = file.records[0].to_record_type().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOperator { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = SchemaFile::from_yaml("records: [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "yaml", .. }));
    }
}
