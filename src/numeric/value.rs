// ============================================================================
// Float Inputs
// Values a float can be constructed from and operands of arithmetic
// ============================================================================

use super::float::Float;
use rust_decimal::Decimal;
use std::borrow::Cow;

/// Source value for constructing a [`Float`].
#[derive(Debug, Clone)]
pub enum FloatValue<'a> {
    /// No value: the float is allocated with its precision but never
    /// written (reads as NaN on engines that initialize to NaN)
    Null,
    /// Integer primitive
    Int(i64),
    /// Floating-point primitive
    Double(f64),
    /// Literal in the float's radix
    Text(Cow<'a, str>),
    /// Exact decimal, always parsed in radix 10
    Decimal(Decimal),
    /// Copy of another float of the same context
    Float(&'a Float),
}

impl From<i32> for FloatValue<'_> {
    fn from(value: i32) -> Self {
        FloatValue::Int(i64::from(value))
    }
}

impl From<i64> for FloatValue<'_> {
    fn from(value: i64) -> Self {
        FloatValue::Int(value)
    }
}

impl From<u32> for FloatValue<'_> {
    fn from(value: u32) -> Self {
        FloatValue::Int(i64::from(value))
    }
}

impl From<f32> for FloatValue<'_> {
    fn from(value: f32) -> Self {
        FloatValue::Double(f64::from(value))
    }
}

impl From<f64> for FloatValue<'_> {
    fn from(value: f64) -> Self {
        FloatValue::Double(value)
    }
}

impl<'a> From<&'a str> for FloatValue<'a> {
    fn from(value: &'a str) -> Self {
        FloatValue::Text(Cow::Borrowed(value))
    }
}

impl From<String> for FloatValue<'_> {
    fn from(value: String) -> Self {
        FloatValue::Text(Cow::Owned(value))
    }
}

impl From<Decimal> for FloatValue<'_> {
    fn from(value: Decimal) -> Self {
        FloatValue::Decimal(value)
    }
}

impl<'a> From<&'a Float> for FloatValue<'a> {
    fn from(value: &'a Float) -> Self {
        FloatValue::Float(value)
    }
}

impl<T: Into<FloatValue<'static>>> From<Option<T>> for FloatValue<'static> {
    fn from(value: Option<T>) -> Self {
        value.map_or(FloatValue::Null, Into::into)
    }
}

// ============================================================================
// Operands
// ============================================================================

/// Right-hand side of an arithmetic operation.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Int(i64),
    Double(f64),
    Float(&'a Float),
}

impl Operand<'_> {
    /// The operand as an exact 32-bit integer, if it is one. Negative zero
    /// is excluded so its sign survives.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Operand::Int(value) => i32::try_from(value).ok(),
            Operand::Double(value) => exact_i32(value),
            Operand::Float(_) => None,
        }
    }
}

impl From<i32> for Operand<'_> {
    fn from(value: i32) -> Self {
        Operand::Int(i64::from(value))
    }
}

impl From<i64> for Operand<'_> {
    fn from(value: i64) -> Self {
        Operand::Int(value)
    }
}

impl From<u32> for Operand<'_> {
    fn from(value: u32) -> Self {
        Operand::Int(i64::from(value))
    }
}

impl From<f32> for Operand<'_> {
    fn from(value: f32) -> Self {
        Operand::Double(f64::from(value))
    }
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Operand::Double(value)
    }
}

impl<'a> From<&'a Float> for Operand<'a> {
    fn from(value: &'a Float) -> Self {
        Operand::Float(value)
    }
}

/// `value` as an `i32` when it is integral, in range and not `-0.0`.
pub(crate) fn exact_i32(value: f64) -> Option<i32> {
    let in_range = value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX);
    if in_range && value.fract() == 0.0 && !(value == 0.0 && value.is_sign_negative()) {
        Some(value as i32)
    } else {
        None
    }
}
