//! Integration tests for the Filter and Record derive macros.
//!
//! These tests verify that the derives build descriptors, extract field
//! values and generate field constants from `#[sieve(...)]` annotations.

#![cfg(feature = "derive")]
#![allow(dead_code)] // Some fields are intentionally skipped for testing

use sieve::emit::{DocumentEmitter, MapEmitter, SearchEmitter};
use sieve::{
    Compiler, CompilerConfig, FieldValue, Filter, FilterMeta, Int64Range, Op, Record, Scheme,
    TimeRange, Timestamp, Value,
};

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Record)]
struct User {
    #[sieve(column = "id", doc = "_id", id)]
    id: String,
    #[sieve(column = "full_name", doc = "name")]
    name: String,
    #[sieve(json = "createdAt", column = "created_at", doc = "createdAt")]
    created_at: Timestamp,
    #[sieve(json = "-", column = "password_hash")]
    password_hash: String,
}

#[derive(Filter, Default)]
#[sieve(record = User)]
struct UserFilter {
    #[sieve(column = "full_name", doc = "name", op = "like", keyword)]
    name: Option<String>,
    #[sieve(column = "email", doc = "email", keyword = "eq")]
    email: String,
    #[sieve(column = "age", doc = "age")]
    age: Option<Int64Range>,
    #[sieve(json = "createdAt", column = "created_at", doc = "createdAt")]
    created_at: Option<TimeRange>,
    #[sieve(column = "tag", doc = "tags")]
    tags: Vec<String>,
    #[sieve(skip)]
    internal: u32,
    meta: FilterMeta,
}

#[derive(Filter, Default)]
struct Standalone {
    #[sieve(column = "score", op = ">=")]
    score: Option<i64>,
    #[sieve(column = "uid", id)]
    uid: Option<String>,
    meta: FilterMeta,
}

fn unpaged() -> CompilerConfig {
    CompilerConfig {
        default_limit: None,
        ..CompilerConfig::default()
    }
}

// =============================================================================
// Descriptor tests
// =============================================================================

#[test]
fn test_record_descriptor() {
    let ty = User::record_type();
    assert_eq!(ty.name(), "User");
    assert_eq!(ty.len(), 4);
    assert_eq!(ty.identity().unwrap().ident(), "id");
    assert_eq!(ty.external_name(1, Scheme::Json), Some("name"));
    assert_eq!(ty.external_name(1, Scheme::Column), Some("full_name"));
    assert_eq!(ty.external_name(3, Scheme::Json), Some("password_hash"));
    assert_eq!(ty.external_name(3, Scheme::Document), None);
}

#[test]
fn test_descriptor_is_built_once() {
    assert!(std::ptr::eq(User::record_type(), User::record_type()));
    assert!(std::ptr::eq(UserFilter::filter_type(), UserFilter::filter_type()));
}

#[test]
fn test_skip_removes_field() {
    let ty = UserFilter::filter_type();
    assert_eq!(ty.len(), 6);
    assert!(ty.fields().iter().all(|f| f.ident() != "internal"));
}

#[test]
fn test_tags_become_ops() {
    let ty = UserFilter::filter_type();
    assert_eq!(ty.fields()[0].op_override(), Some(Op::Contains));
    let kw: Vec<(&str, Op)> = ty.keyword_fields().map(|(f, m)| (f.ident(), m)).collect();
    assert_eq!(kw, vec![("name", Op::Contains), ("email", Op::Eq)]);
}

#[test]
fn test_target_type_is_record() {
    assert_eq!(UserFilter::target_type().name(), "User");
    assert_eq!(Standalone::target_type().name(), "Standalone");
}

#[test]
fn test_field_constants_generated() {
    assert_eq!(UserFilter::NAME, "name");
    assert_eq!(UserFilter::CREATED_AT, "createdAt");
    assert_eq!(UserFilter::TAGS, "tags");
    assert_eq!(Standalone::SCORE, "score");
}

#[test]
fn test_field_values_in_declaration_order() {
    let meta = FilterMeta::default();
    let filter = UserFilter {
        name: Some("ann".into()),
        tags: vec!["a".into()],
        meta: meta.clone(),
        ..Default::default()
    };
    let values = filter.field_values();
    assert_eq!(values.len(), 6);
    assert_eq!(values[0], FieldValue::Scalar(Value::String("ann")));
    assert_eq!(values[1], FieldValue::Scalar(Value::String("")));
    assert_eq!(values[2], FieldValue::Unset);
    assert_eq!(values[4], FieldValue::List(vec![Value::String("a")]));
    assert_eq!(values[5], FieldValue::Meta(&meta));
}

// =============================================================================
// Compilation through derived types
// =============================================================================

#[test]
fn test_projection_and_sort_use_target_record() {
    let compiler = Compiler::<MapEmitter>::for_filter::<UserFilter>(unpaged()).unwrap();
    let filter = UserFilter {
        meta: FilterMeta::default()
            .with_fields(["name", "createdAt"])
            .with_sort(format!("-{},{}", UserFilter::CREATED_AT, User::record_type().fields()[0].ident())),
        ..Default::default()
    };
    let q = compiler.compile(&filter);
    assert_eq!(q.fields, "full_name,created_at");
    assert_eq!(q.sort, "created_at desc,id asc");
}

#[test]
fn test_exclusion_uses_record_identity() {
    let compiler = Compiler::<DocumentEmitter>::for_filter::<UserFilter>(unpaged()).unwrap();
    let filter = UserFilter {
        meta: FilterMeta::default().excluding(["a"]),
        ..Default::default()
    };
    let q = compiler.compile(&filter);
    assert_eq!(q.filter.len(), 1);
    assert_eq!(q.filter[0].0, "_id");
}

#[test]
fn test_comparison_override() {
    let compiler = Compiler::<DocumentEmitter>::for_filter::<Standalone>(unpaged()).unwrap();
    let q = compiler.compile(&Standalone {
        score: Some(50),
        ..Default::default()
    });
    // score has no document name; the document backend cannot see it
    assert!(q.filter.is_empty());

    let compiler = Compiler::<MapEmitter>::for_filter::<Standalone>(unpaged()).unwrap();
    let q = compiler.compile(&Standalone {
        score: Some(50),
        ..Default::default()
    });
    // map backend compiles comparisons to equality
    assert_eq!(
        q.predicates["score"],
        sieve::emit::Condition::Eq(sieve::Scalar::from(50i64))
    );
}

#[test]
fn test_identity_of_filter_itself() {
    let compiler = Compiler::<MapEmitter>::for_filter::<Standalone>(unpaged()).unwrap();
    let q = compiler.compile(&Standalone {
        meta: FilterMeta::default().excluding(["u1"]),
        ..Default::default()
    });
    assert_eq!(
        q.predicates["uid"],
        sieve::emit::Condition::NotIn(vec![sieve::Scalar::from("u1")])
    );
}

#[test]
fn test_meta_field_is_not_sortable_or_projectable() {
    let ty = Standalone::filter_type();
    assert!(ty.fields()[2].is_meta());
    assert_eq!(ty.external_name(2, Scheme::Json), None);

    let compiler = Compiler::<SearchEmitter>::for_filter::<Standalone>(unpaged()).unwrap();
    let q = compiler.compile(&Standalone {
        meta: FilterMeta::default().with_sort("meta").with_fields(["meta"]),
        ..Default::default()
    });
    assert!(q.sort.is_empty());
    assert!(q.source.is_empty());
}
