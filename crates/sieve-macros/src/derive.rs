//! Implementation of the `#[derive(Filter)]` and `#[derive(Record)]` macros.
//!
//! Both build a static `RecordType` descriptor from the field attributes.
//! `Filter` additionally generates field-value extraction and field name
//! constants for type-safe sort and projection strings.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DeriveInput, Error, Fields, Ident, Result, Type};

use super::attrs::{parse_container_attrs, parse_sieve_attrs, SieveAttr};

struct FieldSpec {
    ident: Ident,
    attr: SieveAttr,
}

impl FieldSpec {
    /// The JSON name, or `None` for `json = "-"` and meta fields.
    fn json_name(&self) -> Option<String> {
        if self.attr.meta {
            return None;
        }
        match self.attr.json.as_deref() {
            Some("-") | Some("") => None,
            Some(name) => Some(name.to_string()),
            None => Some(self.ident.to_string()),
        }
    }

    /// The name callers reference this field by.
    fn reference_name(&self) -> String {
        self.json_name()
            .or_else(|| self.attr.column.clone())
            .unwrap_or_else(|| self.ident.to_string())
    }

    fn descriptor(&self) -> TokenStream {
        let ident = self.ident.to_string();
        let mut def = quote! { ::sieve::FieldDef::new(#ident) };

        if self.attr.meta {
            return quote! { #def.meta() };
        }

        if let Some(json) = self.json_name() {
            def = quote! { #def.json(#json) };
        }
        if let Some(column) = &self.attr.column {
            def = quote! { #def.column(#column) };
        }
        if let Some(doc) = &self.attr.doc {
            def = quote! { #def.document(#doc) };
        }
        if let Some(op) = self.attr.op {
            let op = op.to_tokens();
            def = quote! { #def.op(#op) };
        }
        if let Some(mode) = self.attr.keyword_mode() {
            let mode = mode.to_tokens();
            def = quote! { #def.keyword(#mode) };
        }
        if self.attr.id {
            def = quote! { #def.identity() };
        }
        if self.attr.nullable {
            def = quote! { #def.nullable() };
        }
        def
    }
}

/// Whether the field type is `FilterMeta` (any path ending in it).
fn is_filter_meta(ty: &Type) -> bool {
    match ty {
        Type::Path(p) => p
            .path
            .segments
            .last()
            .is_some_and(|seg| seg.ident == "FilterMeta"),
        _ => false,
    }
}

/// Collects non-skipped named fields, rejecting duplicate identity marks.
fn collect_fields(input: &DeriveInput, derive: &str) -> Result<Vec<FieldSpec>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    format!("{derive} can only be derived for structs with named fields"),
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                format!("{derive} can only be derived for structs"),
            ))
        }
    };

    let mut specs: Vec<FieldSpec> = Vec::new();
    for field in fields.iter() {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let mut attr = parse_sieve_attrs(&field.attrs)?;
        attr.meta |= is_filter_meta(&field.ty);

        // Skip if marked with #[sieve(skip)]
        if attr.skip {
            continue;
        }

        if attr.id {
            if let Some(first) = specs.iter().find(|s| s.attr.id) {
                return Err(Error::new(
                    attr.span,
                    format!(
                        "only one field may be marked `id`; '{}' already is",
                        first.ident
                    ),
                ));
            }
        }

        specs.push(FieldSpec { ident, attr });
    }
    Ok(specs)
}

fn descriptor_body(input: &DeriveInput, specs: &[FieldSpec]) -> TokenStream {
    let name = input.ident.to_string();
    let defs = specs.iter().map(FieldSpec::descriptor);
    quote! {
        static TYPE: ::sieve::__private::OnceCell<::sieve::RecordType> =
            ::sieve::__private::OnceCell::new();
        TYPE.get_or_init(|| {
            ::sieve::__private::record_type(#name, ::std::vec![#(#defs),*])
        })
    }
}

/// Main implementation of the Filter derive macro.
pub fn filter_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let container = parse_container_attrs(&input.attrs)?;
    let specs = collect_fields(&input, "Filter")?;

    let mut field_constants: Vec<TokenStream> = Vec::new();
    for spec in specs.iter().filter(|s| !s.attr.meta) {
        let reference = spec.reference_name();
        // Generate constant name (SCREAMING_SNAKE_CASE)
        let const_name = format_ident!("{}", to_screaming_snake_case(&spec.ident.to_string()));
        field_constants.push(quote! {
            /// Field name constant for sort and projection strings.
            pub const #const_name: &'static str = #reference;
        });
    }

    let idents = specs.iter().map(|s| &s.ident);
    let body = descriptor_body(&input, &specs);

    let target = container.record.map(|record| {
        quote! {
            fn target_type() -> &'static ::sieve::RecordType {
                <#record as ::sieve::Record>::record_type()
            }
        }
    });

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#field_constants)*
        }

        impl #impl_generics ::sieve::Filter for #struct_name #ty_generics #where_clause {
            fn filter_type() -> &'static ::sieve::RecordType {
                #body
            }

            #target

            fn field_values(&self) -> ::std::vec::Vec<::sieve::FieldValue<'_>> {
                ::std::vec![#(::sieve::AsFieldValue::as_field_value(&self.#idents)),*]
            }
        }
    };

    Ok(expanded)
}

/// Main implementation of the Record derive macro.
pub fn record_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let specs = collect_fields(&input, "Record")?;
    let body = descriptor_body(&input, &specs);

    Ok(quote! {
        impl #impl_generics ::sieve::Record for #struct_name #ty_generics #where_clause {
            fn record_type() -> &'static ::sieve::RecordType {
                #body
            }
        }
    })
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = true;
        }
    }

    result
}
