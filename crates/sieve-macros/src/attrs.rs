//! Attribute parsing for the `Filter` and `Record` derive macros.
//!
//! Field attributes: `#[sieve(json = "..", column = "..", doc = "..",
//! op = "..", keyword, keyword = "..", id, nullable, skip)]`.
//! Struct attribute: `#[sieve(record = Type)]`.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Expr, ExprLit, ExprPath, Lit, LitStr, Meta, Path, Result, Token,
};

/// Operator tag, mirrored from `sieve::Op` so tags are checked at expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpTag {
    Eq,
    Contains,
    Prefix,
    Suffix,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl OpTag {
    /// Parses the tag vocabulary. Case-insensitive, surrounding whitespace ignored.
    pub fn from_str(s: &str, span: Span) -> Result<Self> {
        let op = match s.trim().to_ascii_lowercase().as_str() {
            "=" | "==" | "eq" | "equal" | "equals" | "exact" => OpTag::Eq,
            "like" | "contains" | "substring" => OpTag::Contains,
            "prefix" | "startswith" | "starts_with" => OpTag::Prefix,
            "suffix" | "endswith" | "ends_with" => OpTag::Suffix,
            ">" | "gt" => OpTag::Gt,
            ">=" | "gte" => OpTag::Gte,
            "<" | "lt" => OpTag::Lt,
            "<=" | "lte" => OpTag::Lte,
            other => {
                return Err(Error::new(
                    span,
                    format!(
                        "unknown operator tag: '{}'. Expected one of: eq, like, prefix, suffix, gt, gte, lt, lte",
                        other
                    ),
                ))
            }
        };
        Ok(op)
    }

    pub fn is_string_op(self) -> bool {
        matches!(
            self,
            OpTag::Eq | OpTag::Contains | OpTag::Prefix | OpTag::Suffix
        )
    }

    /// The `::sieve::Op` path for this tag.
    pub fn to_tokens(self) -> TokenStream {
        match self {
            OpTag::Eq => quote! { ::sieve::Op::Eq },
            OpTag::Contains => quote! { ::sieve::Op::Contains },
            OpTag::Prefix => quote! { ::sieve::Op::Prefix },
            OpTag::Suffix => quote! { ::sieve::Op::Suffix },
            OpTag::Gt => quote! { ::sieve::Op::Gt },
            OpTag::Gte => quote! { ::sieve::Op::Gte },
            OpTag::Lt => quote! { ::sieve::Op::Lt },
            OpTag::Lte => quote! { ::sieve::Op::Lte },
        }
    }
}

/// Keyword participation of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordAttr {
    /// Bare `keyword`: use the field's `op` if it is a string mode, else prefix.
    Inherit,
    Mode(OpTag),
}

/// Field-level attributes from `#[sieve(...)]`.
#[derive(Debug, Clone)]
pub struct SieveAttr {
    /// JSON name. `None` means the Rust identifier; `Some("-")` means none.
    pub json: Option<String>,
    pub column: Option<String>,
    pub doc: Option<String>,
    pub op: Option<OpTag>,
    pub keyword: Option<KeywordAttr>,
    pub id: bool,
    pub nullable: bool,
    /// Reserved meta-object slot. Implied by a `FilterMeta` field type.
    pub meta: bool,
    pub skip: bool,
    /// The span for error reporting.
    pub span: Span,
}

impl Default for SieveAttr {
    fn default() -> Self {
        SieveAttr {
            json: None,
            column: None,
            doc: None,
            op: None,
            keyword: None,
            id: false,
            nullable: false,
            meta: false,
            skip: false,
            span: Span::call_site(),
        }
    }
}

impl SieveAttr {
    /// The effective keyword mode, if the field participates.
    pub fn keyword_mode(&self) -> Option<OpTag> {
        self.keyword.map(|k| match k {
            KeywordAttr::Mode(mode) => mode,
            KeywordAttr::Inherit => self
                .op
                .filter(|op| op.is_string_op())
                .unwrap_or(OpTag::Prefix),
        })
    }
}

fn string_value(value: &Expr, key: &str) -> Result<LitStr> {
    if let Expr::Lit(ExprLit {
        lit: Lit::Str(s), ..
    }) = value
    {
        Ok(s.clone())
    } else {
        Err(Error::new(
            value.span(),
            format!("{key} must be a string literal"),
        ))
    }
}

impl Parse for SieveAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = SieveAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                // Flags: keyword, id, nullable, meta, skip
                Meta::Path(p) => {
                    if p.is_ident("keyword") {
                        attr.keyword = Some(KeywordAttr::Inherit);
                    } else if p.is_ident("id") {
                        attr.id = true;
                    } else if p.is_ident("nullable") {
                        attr.nullable = true;
                    } else if p.is_ident("meta") {
                        attr.meta = true;
                    } else if p.is_ident("skip") {
                        attr.skip = true;
                    } else {
                        return Err(Error::new(
                            p.span(),
                            "unknown sieve flag. Expected: keyword, id, nullable, meta, or skip",
                        ));
                    }
                }

                // json = "..", column = "..", doc = "..", op = "..", keyword = ".."
                Meta::NameValue(nv) => {
                    if nv.path.is_ident("json") {
                        attr.json = Some(string_value(&nv.value, "json")?.value());
                    } else if nv.path.is_ident("column") {
                        attr.column = Some(string_value(&nv.value, "column")?.value());
                    } else if nv.path.is_ident("doc") || nv.path.is_ident("document") {
                        attr.doc = Some(string_value(&nv.value, "doc")?.value());
                    } else if nv.path.is_ident("op") {
                        let s = string_value(&nv.value, "op")?;
                        attr.op = Some(OpTag::from_str(&s.value(), s.span())?);
                    } else if nv.path.is_ident("keyword") {
                        let s = string_value(&nv.value, "keyword")?;
                        let mode = OpTag::from_str(&s.value(), s.span())?;
                        if !mode.is_string_op() {
                            return Err(Error::new(
                                s.span(),
                                "keyword mode must be one of: eq, like, prefix, suffix",
                            ));
                        }
                        attr.keyword = Some(KeywordAttr::Mode(mode));
                    } else {
                        return Err(Error::new(
                            nv.path.span(),
                            "unknown attribute. Expected: json, column, doc, op, or keyword",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown sieve attribute. Expected: json = \"...\", column = \"...\", doc = \"...\", op = \"...\", keyword, id, nullable, meta, or skip",
                    ));
                }
            }
        }

        Ok(attr)
    }
}

/// Extract `#[sieve(...)]` attributes from a field's attributes.
pub fn parse_sieve_attrs(attrs: &[Attribute]) -> Result<SieveAttr> {
    for attr in attrs {
        if attr.path().is_ident("sieve") {
            let mut parsed = attr.parse_args::<SieveAttr>()?;
            parsed.span = attr.span();
            return Ok(parsed);
        }
    }
    Ok(SieveAttr::default())
}

/// Struct-level attributes from `#[sieve(...)]`.
#[derive(Debug, Clone, Default)]
pub struct ContainerAttr {
    /// Record type searched by this filter.
    pub record: Option<Path>,
}

impl Parse for ContainerAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = ContainerAttr::default();
        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::NameValue(nv) if nv.path.is_ident("record") => {
                    attr.record = Some(match &nv.value {
                        Expr::Path(ExprPath { path, .. }) => path.clone(),
                        Expr::Lit(ExprLit {
                            lit: Lit::Str(s), ..
                        }) => s.parse::<Path>()?,
                        other => {
                            return Err(Error::new(
                                other.span(),
                                "record must be a type path, e.g. record = User",
                            ))
                        }
                    });
                }
                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown struct attribute. Expected: record = Type",
                    ));
                }
            }
        }

        Ok(attr)
    }
}

/// Extract struct-level `#[sieve(...)]` attributes.
pub fn parse_container_attrs(attrs: &[Attribute]) -> Result<ContainerAttr> {
    for attr in attrs {
        if attr.path().is_ident("sieve") {
            return attr.parse_args::<ContainerAttr>();
        }
    }
    Ok(ContainerAttr::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_sieve(tokens: &str) -> Result<SieveAttr> {
        syn::parse_str::<SieveAttr>(tokens)
    }

    #[test]
    fn test_empty() {
        let attr = parse_sieve("").unwrap();
        assert_eq!(attr.json, None);
        assert_eq!(attr.op, None);
        assert!(!attr.skip);
    }

    #[test]
    fn test_names() {
        let attr = parse_sieve(r#"json = "createdAt", column = "created_at", doc = "created""#).unwrap();
        assert_eq!(attr.json.as_deref(), Some("createdAt"));
        assert_eq!(attr.column.as_deref(), Some("created_at"));
        assert_eq!(attr.doc.as_deref(), Some("created"));
    }

    #[test]
    fn test_document_alias() {
        let attr = parse_sieve(r#"document = "_id""#).unwrap();
        assert_eq!(attr.doc.as_deref(), Some("_id"));
    }

    #[test]
    fn test_op_spellings() {
        assert_eq!(parse_sieve(r#"op = "like""#).unwrap().op, Some(OpTag::Contains));
        assert_eq!(parse_sieve(r#"op = ">=""#).unwrap().op, Some(OpTag::Gte));
        assert_eq!(parse_sieve(r#"op = "EQUAL""#).unwrap().op, Some(OpTag::Eq));
        assert_eq!(parse_sieve(r#"op = " lt ""#).unwrap().op, Some(OpTag::Lt));
    }

    #[test]
    fn test_unknown_op() {
        let result = parse_sieve(r#"op = "~~""#);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("unknown operator tag"));
    }

    #[test]
    fn test_bare_keyword_inherits() {
        let attr = parse_sieve(r#"op = "suffix", keyword"#).unwrap();
        assert_eq!(attr.keyword_mode(), Some(OpTag::Suffix));

        let attr = parse_sieve(r#"op = "gt", keyword"#).unwrap();
        assert_eq!(attr.keyword_mode(), Some(OpTag::Prefix));

        let attr = parse_sieve("keyword").unwrap();
        assert_eq!(attr.keyword_mode(), Some(OpTag::Prefix));
    }

    #[test]
    fn test_keyword_mode() {
        let attr = parse_sieve(r#"keyword = "contains""#).unwrap();
        assert_eq!(attr.keyword_mode(), Some(OpTag::Contains));
        assert!(parse_sieve(r#"keyword = "gte""#).is_err());
    }

    #[test]
    fn test_flags() {
        let attr = parse_sieve("id, nullable").unwrap();
        assert!(attr.id);
        assert!(attr.nullable);
        assert!(parse_sieve("skip").unwrap().skip);
        assert!(parse_sieve("meta").unwrap().meta);
    }

    #[test]
    fn test_unknown_flag() {
        let err = parse_sieve("indexed").unwrap_err();
        assert!(err.to_string().contains("unknown sieve flag"));
    }

    #[test]
    fn test_non_string_value() {
        let err = parse_sieve("json = 3").unwrap_err();
        assert!(err.to_string().contains("json must be a string literal"));
    }

    #[test]
    fn test_container_record() {
        let attr = syn::parse_str::<ContainerAttr>("record = crate::User").unwrap();
        let path = attr.record.unwrap();
        assert_eq!(path.segments.last().unwrap().ident, "User");

        let attr = syn::parse_str::<ContainerAttr>(r#"record = "User""#).unwrap();
        assert!(attr.record.unwrap().is_ident("User"));
    }

    #[test]
    fn test_container_unknown() {
        assert!(syn::parse_str::<ContainerAttr>("table = \"x\"").is_err());
    }
}
