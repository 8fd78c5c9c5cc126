//! Runtime value types for filter fields.
//!
//! A filter struct exposes each of its fields as a [`FieldValue`], a closed
//! tagged union over the shapes the compiler understands: unset, scalar,
//! range, collection, or the embedded [`FilterMeta`]. Classification is a
//! pattern match over this enum; the [`AsFieldValue`] trait produces it from
//! ordinary Rust field types.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Serialize, Serializer};

use crate::meta::FilterMeta;
use crate::range::{Range, RangeValue};

/// Scalar value borrowed from a filter field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// String value (borrowed).
    String(&'a str),
    /// Numeric value.
    Number(Number),
    /// Timestamp value (milliseconds since Unix epoch).
    Timestamp(Timestamp),
    /// Boolean value.
    Bool(bool),
    /// Field not present or null.
    None,
}

impl<'a> Value<'a> {
    /// Returns `true` if this is a `None` value.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Returns `true` for values the compiler treats as "unset".
    ///
    /// Empty strings, numeric zero, `false`, the epoch timestamp and `None`
    /// are all zero. A filter can therefore never ask for `count == 0` or
    /// `active == false`; this convention is load-bearing for callers that
    /// decode sparse query strings into fully-populated structs.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::String(s) => s.is_empty(),
            Value::Number(n) => n.is_zero(),
            Value::Timestamp(t) => t.0 == 0,
            Value::Bool(b) => !b,
            Value::None => true,
        }
    }

    /// Converts into an owned [`Scalar`]. `None` has no scalar form.
    pub fn to_scalar(&self) -> Option<Scalar> {
        match self {
            Value::String(s) => Some(Scalar::String((*s).to_string())),
            Value::Number(n) => Some(Scalar::Number(*n)),
            Value::Timestamp(t) => Some(Scalar::Time(*t)),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::None => None,
        }
    }

    /// Converts into a JSON value. Timestamps become RFC 3339 strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String((*s).to_string()),
            Value::Number(n) => n.to_json(),
            Value::Timestamp(t) => serde_json::Value::String(t.to_rfc3339()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::None => serde_json::Value::Null,
        }
    }
}

/// Numeric value supporting all common numeric types.
///
/// Numbers are stored in one of three variants to preserve precision:
/// - `I64` for signed integers
/// - `U64` for unsigned integers
/// - `F64` for floating point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Returns `true` for `0` in any representation.
    pub fn is_zero(self) -> bool {
        match self {
            Number::I64(n) => n == 0,
            Number::U64(n) => n == 0,
            Number::F64(n) => n == 0.0,
        }
    }

    /// Converts into a JSON number. Non-finite floats become `null`.
    pub fn to_json(self) -> serde_json::Value {
        match self {
            Number::I64(n) => serde_json::Value::from(n),
            Number::U64(n) => serde_json::Value::from(n),
            Number::F64(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

macro_rules! number_from {
    ($variant:ident as $repr:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Number {
                fn from(n: $t) -> Self {
                    Number::$variant(n as $repr)
                }
            }
        )*
    };
}

number_from!(I64 as i64: i8, i16, i32, i64, isize);
number_from!(U64 as u64: u8, u16, u32, u64, usize);
number_from!(F64 as f64: f32, f64);

/// Timestamp value represented as milliseconds since Unix epoch.
///
/// The epoch itself (`Timestamp(0)`) is the zero value and is treated as
/// unset by the compiler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a new timestamp from seconds since Unix epoch.
    ///
    /// Saturates at the `i64` millisecond range.
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs.saturating_mul(1000))
    }

    /// Returns the timestamp as a UTC datetime, if representable.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }

    /// Formats as RFC 3339 with millisecond precision (`2024-01-29T03:46:40.000Z`).
    ///
    /// Out-of-range timestamps fall back to the raw millisecond count.
    pub fn to_rfc3339(self) -> String {
        match self.to_datetime() {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            None => self.0.to_string(),
        }
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Timestamp(millis)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp_millis())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> serde::Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Millis(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Millis(ms) => Ok(Timestamp(ms)),
            Raw::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| Timestamp(dt.timestamp_millis()))
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Owned scalar, used by outputs that outlive the filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Number(Number),
    Time(Timestamp),
    Bool(bool),
}

impl Scalar {
    /// Converts into a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::String(s) => serde_json::Value::String(s.clone()),
            Scalar::Number(n) => n.to_json(),
            Scalar::Time(t) => serde_json::Value::String(t.to_rfc3339()),
            Scalar::Bool(b) => serde_json::Value::Bool(*b),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(Number::I64(n))
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(Number::F64(n))
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<Timestamp> for Scalar {
    fn from(t: Timestamp) -> Self {
        Scalar::Time(t)
    }
}

/// The runtime shape of one filter field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    /// Absent (`None`). Never produces a predicate.
    Unset,
    /// A single scalar.
    Scalar(Value<'a>),
    /// One of the five range value types.
    Range(RangeValue),
    /// A collection; produces a membership predicate when non-empty.
    List(Vec<Value<'a>>),
    /// The embedded search-control object.
    Meta(&'a FilterMeta),
}

/// Conversion of a single item into a scalar [`Value`].
///
/// Implemented for the types that may appear inside a collection field.
pub trait AsValue {
    fn as_value(&self) -> Value<'_>;
}

/// Conversion of a filter field into its [`FieldValue`] shape.
///
/// `#[derive(Filter)]` calls this for every field. Implement it for custom
/// field types to make them usable in filters.
///
/// ```
/// use sieve::{AsFieldValue, FieldValue, Value};
///
/// struct Slug(String);
///
/// impl AsFieldValue for Slug {
///     fn as_field_value(&self) -> FieldValue<'_> {
///         FieldValue::Scalar(Value::String(&self.0))
///     }
/// }
///
/// let slug = Slug("hello".into());
/// assert_eq!(slug.as_field_value(), FieldValue::Scalar(Value::String("hello")));
/// ```
pub trait AsFieldValue {
    fn as_field_value(&self) -> FieldValue<'_>;
}

impl AsValue for String {
    fn as_value(&self) -> Value<'_> {
        Value::String(self)
    }
}

impl AsValue for &str {
    fn as_value(&self) -> Value<'_> {
        Value::String(self)
    }
}

impl AsValue for bool {
    fn as_value(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

impl AsValue for Timestamp {
    fn as_value(&self) -> Value<'_> {
        Value::Timestamp(*self)
    }
}

impl AsValue for DateTime<Utc> {
    fn as_value(&self) -> Value<'_> {
        Value::Timestamp(Timestamp::from(*self))
    }
}

macro_rules! number_as_value {
    ($($t:ty),*) => {
        $(
            impl AsValue for $t {
                fn as_value(&self) -> Value<'_> {
                    Value::Number(Number::from(*self))
                }
            }
        )*
    };
}

number_as_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

macro_rules! scalar_field {
    ($($t:ty),*) => {
        $(
            impl AsFieldValue for $t {
                fn as_field_value(&self) -> FieldValue<'_> {
                    FieldValue::Scalar(self.as_value())
                }
            }
        )*
    };
}

scalar_field!(
    String,
    &str,
    bool,
    Timestamp,
    DateTime<Utc>,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64
);

impl<T: AsFieldValue> AsFieldValue for Option<T> {
    fn as_field_value(&self) -> FieldValue<'_> {
        match self {
            Some(inner) => inner.as_field_value(),
            None => FieldValue::Unset,
        }
    }
}

impl<T: AsValue> AsFieldValue for Vec<T> {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::List(self.iter().map(AsValue::as_value).collect())
    }
}

impl<T> AsFieldValue for Range<T>
where
    Range<T>: Into<RangeValue> + Copy,
{
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Range((*self).into())
    }
}

impl AsFieldValue for FilterMeta {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Meta(self)
    }
}
