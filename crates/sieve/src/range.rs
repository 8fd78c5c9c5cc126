//! Range value types.
//!
//! A [`Range`] carries optional bounds and nothing else; the compiler turns
//! them into one or two interval predicates. Five concrete flavors exist so a
//! filter can declare the element type it expects from its transport:
//! [`TimeRange`], [`NumberRange`], [`Int32Range`], [`Int64Range`] and
//! [`IntRange`].
//!
//! Bound precedence:
//!
//! | Side  | Inclusive | Exclusive           |
//! |-------|-----------|---------------------|
//! | lower | `min`     | `lower`, `bottom`   |
//! | upper | `max`     | `top`               |
//!
//! The inclusive bound wins when both are set on one side.

use serde::{Deserialize, Serialize};

use crate::op::Op;
use crate::value::{Number, Timestamp, Value};

/// An interval over `T` with optional bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Range<T> {
    /// Inclusive lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<T>,
    /// Inclusive upper bound. Takes precedence over `top`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<T>,
    /// Exclusive upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<T>,
    /// Exclusive lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower: Option<T>,
    /// Exclusive lower bound, alternate spelling of `lower`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<T>,
}

/// Timestamp interval.
pub type TimeRange = Range<Timestamp>;
/// Floating point interval.
pub type NumberRange = Range<f64>;
/// 32-bit integer interval.
pub type Int32Range = Range<i32>;
/// 64-bit integer interval.
pub type Int64Range = Range<i64>;
/// Pointer-sized integer interval.
pub type IntRange = Range<isize>;

impl<T> Range<T> {
    /// `min <= x <= max`.
    pub fn between(min: T, max: T) -> Self {
        Range {
            min: Some(min),
            max: Some(max),
            top: None,
            lower: None,
            bottom: None,
        }
    }

    /// `x >= min`.
    pub fn at_least(min: T) -> Self {
        Range {
            min: Some(min),
            max: None,
            top: None,
            lower: None,
            bottom: None,
        }
    }

    /// `x <= max`.
    pub fn at_most(max: T) -> Self {
        Range {
            min: None,
            max: Some(max),
            top: None,
            lower: None,
            bottom: None,
        }
    }

    /// `x < top`.
    pub fn below(top: T) -> Self {
        Range {
            min: None,
            max: None,
            top: Some(top),
            lower: None,
            bottom: None,
        }
    }

    /// `x > lower`.
    pub fn above(lower: T) -> Self {
        Range {
            min: None,
            max: None,
            top: None,
            lower: Some(lower),
            bottom: None,
        }
    }
}

/// Element types a range may carry.
pub trait RangeBound: Copy {
    fn to_value(self) -> Value<'static>;
}

impl RangeBound for Timestamp {
    fn to_value(self) -> Value<'static> {
        Value::Timestamp(self)
    }
}

impl RangeBound for f64 {
    fn to_value(self) -> Value<'static> {
        Value::Number(Number::F64(self))
    }
}

impl RangeBound for i32 {
    fn to_value(self) -> Value<'static> {
        Value::Number(Number::from(self))
    }
}

impl RangeBound for i64 {
    fn to_value(self) -> Value<'static> {
        Value::Number(Number::I64(self))
    }
}

impl RangeBound for isize {
    fn to_value(self) -> Value<'static> {
        Value::Number(Number::from(self))
    }
}

impl<T: RangeBound> Range<T> {
    /// Resolves the effective bounds, or `None` if neither side is set.
    pub fn bounds(&self) -> Option<Bounds> {
        let lower = if let Some(min) = self.min {
            Some(Bound::new(Op::Gte, min.to_value()))
        } else {
            self.lower
                .or(self.bottom)
                .map(|v| Bound::new(Op::Gt, v.to_value()))
        };

        let upper = if let Some(max) = self.max {
            Some(Bound::new(Op::Lte, max.to_value()))
        } else {
            self.top.map(|v| Bound::new(Op::Lt, v.to_value()))
        };

        if lower.is_none() && upper.is_none() {
            return None;
        }
        Some(Bounds { lower, upper })
    }
}

/// One side of an interval: a comparison operator and its operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    /// One of `Gt`, `Gte`, `Lt`, `Lte`.
    pub op: Op,
    pub value: Value<'static>,
}

impl Bound {
    pub fn new(op: Op, value: Value<'static>) -> Self {
        Bound { op, value }
    }
}

/// Resolved interval. At least one side is present.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

impl Bounds {
    /// Iterates the present bounds, lower first.
    pub fn iter(&self) -> impl Iterator<Item = &Bound> {
        self.lower.iter().chain(self.upper.iter())
    }

    /// Number of predicates this interval compiles to (1 or 2).
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }
}

/// A range of any of the five flavors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeValue {
    Time(TimeRange),
    Number(NumberRange),
    Int32(Int32Range),
    Int64(Int64Range),
    Int(IntRange),
}

impl RangeValue {
    /// Resolves the effective bounds of the wrapped range.
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            RangeValue::Time(r) => r.bounds(),
            RangeValue::Number(r) => r.bounds(),
            RangeValue::Int32(r) => r.bounds(),
            RangeValue::Int64(r) => r.bounds(),
            RangeValue::Int(r) => r.bounds(),
        }
    }

    /// The flavor name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            RangeValue::Time(_) => "time",
            RangeValue::Number(_) => "number",
            RangeValue::Int32(_) => "int32",
            RangeValue::Int64(_) => "int64",
            RangeValue::Int(_) => "int",
        }
    }
}

impl From<TimeRange> for RangeValue {
    fn from(r: TimeRange) -> Self {
        RangeValue::Time(r)
    }
}

impl From<NumberRange> for RangeValue {
    fn from(r: NumberRange) -> Self {
        RangeValue::Number(r)
    }
}

impl From<Int32Range> for RangeValue {
    fn from(r: Int32Range) -> Self {
        RangeValue::Int32(r)
    }
}

impl From<Int64Range> for RangeValue {
    fn from(r: Int64Range) -> Self {
        RangeValue::Int64(r)
    }
}

impl From<IntRange> for RangeValue {
    fn from(r: IntRange) -> Self {
        RangeValue::Int(r)
    }
}
