// ============================================================================
// Soft Numbers
// Binary floating point with arbitrary mantissa width and exact rounding
// ============================================================================

use crate::domain::RoundingMode;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::cmp::Ordering;

/// A number value.
///
/// Finite values are `(-1)^negative × mantissa × 2^exponent`. Values stored
/// in a [`SoftNumber`] keep a mantissa of exactly `precision` bits; exact
/// operands built from primitives may carry any mantissa width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    NaN,
    Infinite {
        negative: bool,
    },
    Zero {
        negative: bool,
    },
    Finite {
        negative: bool,
        mantissa: BigUint,
        exponent: i64,
    },
}

impl Value {
    /// Exact value of an `i64`.
    pub fn from_i64(value: i64) -> Self {
        if value == 0 {
            return Value::Zero { negative: false };
        }
        Value::Finite {
            negative: value < 0,
            mantissa: BigUint::from(value.unsigned_abs()),
            exponent: 0,
        }
    }

    /// Exact value of an `f64`.
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Value::NaN;
        }
        if value.is_infinite() {
            return Value::Infinite {
                negative: value < 0.0,
            };
        }
        if value == 0.0 {
            return Value::Zero {
                negative: value.is_sign_negative(),
            };
        }

        let bits = value.to_bits();
        let negative = bits >> 63 == 1;
        let biased = ((bits >> 52) & 0x7ff) as i64;
        let fraction = bits & ((1u64 << 52) - 1);
        let (mantissa, exponent) = if biased == 0 {
            (fraction, -1074)
        } else {
            (fraction | (1u64 << 52), biased - 1075)
        };

        Value::Finite {
            negative,
            mantissa: BigUint::from(mantissa),
            exponent,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Value::NaN => false,
            Value::Infinite { negative }
            | Value::Zero { negative }
            | Value::Finite { negative, .. } => *negative,
        }
    }

    /// The value with its sign flipped. NaN stays NaN.
    pub fn negated(&self) -> Self {
        match self {
            Value::NaN => Value::NaN,
            Value::Infinite { negative } => Value::Infinite {
                negative: !negative,
            },
            Value::Zero { negative } => Value::Zero {
                negative: !negative,
            },
            Value::Finite {
                negative,
                mantissa,
                exponent,
            } => Value::Finite {
                negative: !negative,
                mantissa: mantissa.clone(),
                exponent: *exponent,
            },
        }
    }
}

// ============================================================================
// Exact Results
// ============================================================================

/// Exact outcome of an operation, before rounding to the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exact {
    /// Specials and zeros need no rounding
    Special(Value),
    /// `(-1)^negative × num / den × 2^exp2`, with `num` and `den` non-zero
    Ratio {
        negative: bool,
        num: BigUint,
        den: BigUint,
        exp2: i64,
    },
}

impl Exact {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Finite {
                negative,
                mantissa,
                exponent,
            } => Exact::Ratio {
                negative,
                num: mantissa,
                den: BigUint::one(),
                exp2: exponent,
            },
            other => Exact::Special(other),
        }
    }

    /// Round to `precision` bits.
    pub fn round(self, precision: u32, rnd: RoundingMode) -> Value {
        match self {
            Exact::Special(value) => value,
            Exact::Ratio {
                negative,
                num,
                den,
                exp2,
            } => round_ratio(negative, &num, &den, exp2, precision, rnd),
        }
    }
}

/// Round `num / den × 2^exp2` to a mantissa of exactly `precision` bits.
fn round_ratio(
    negative: bool,
    num: &BigUint,
    den: &BigUint,
    exp2: i64,
    precision: u32,
    rnd: RoundingMode,
) -> Value {
    let precision_bits = u64::from(precision);
    // num / den lies in (2^(nb-db-1), 2^(nb-db+1)), so this shift yields a
    // quotient of precision or precision + 1 bits
    let mut shift = i64::from(precision) - (num.bits() as i64 - den.bits() as i64);

    loop {
        let (quotient, remainder, divisor) = if shift >= 0 {
            let scaled = num << (shift as usize);
            (&scaled / den, &scaled % den, den.clone())
        } else {
            let divisor = den << ((-shift) as usize);
            (num / &divisor, num % &divisor, divisor)
        };

        if quotient.bits() > precision_bits {
            shift -= 1;
            continue;
        }

        let half = (&remainder << 1usize).cmp(&divisor);
        let inexact = !remainder.is_zero();
        let odd = !(&quotient % 2u32).is_zero();

        let mut mantissa = quotient;
        let mut exponent = exp2 - shift;
        if rnd.rounds_up(negative, inexact, half, odd) {
            mantissa += 1u32;
            if mantissa.bits() > precision_bits {
                mantissa >>= 1usize;
                exponent += 1;
            }
        }

        return Value::Finite {
            negative,
            mantissa,
            exponent,
        };
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

/// Exact `a + b`. `precision` is the destination precision, used only to
/// collapse an operand too small to affect the rounded sum.
pub fn add(a: &Value, b: &Value, precision: u32, rnd: RoundingMode) -> Exact {
    match (a, b) {
        (Value::NaN, _) | (_, Value::NaN) => Exact::Special(Value::NaN),
        (Value::Infinite { negative: x }, Value::Infinite { negative: y }) => {
            if x == y {
                Exact::Special(Value::Infinite { negative: *x })
            } else {
                Exact::Special(Value::NaN)
            }
        },
        (Value::Infinite { negative }, _) | (_, Value::Infinite { negative }) => {
            Exact::Special(Value::Infinite {
                negative: *negative,
            })
        },
        (Value::Zero { negative: x }, Value::Zero { negative: y }) => {
            let negative = if x == y {
                *x
            } else {
                rnd == RoundingMode::TowardNegative
            };
            Exact::Special(Value::Zero { negative })
        },
        (Value::Zero { .. }, finite) | (finite, Value::Zero { .. }) => {
            Exact::from_value(finite.clone())
        },
        (
            Value::Finite {
                negative: sa,
                mantissa: ma,
                exponent: ea,
            },
            Value::Finite {
                negative: sb,
                mantissa: mb,
                exponent: eb,
            },
        ) => add_finite((*sa, ma, *ea), (*sb, mb, *eb), precision, rnd),
    }
}

/// Exact `a - b`.
pub fn sub(a: &Value, b: &Value, precision: u32, rnd: RoundingMode) -> Exact {
    add(a, &b.negated(), precision, rnd)
}

/// Exact `a × b`.
pub fn mul(a: &Value, b: &Value) -> Exact {
    match (a, b) {
        (Value::NaN, _) | (_, Value::NaN) => Exact::Special(Value::NaN),
        (Value::Infinite { .. }, Value::Zero { .. }) | (Value::Zero { .. }, Value::Infinite { .. }) => {
            Exact::Special(Value::NaN)
        },
        (Value::Infinite { .. }, _) | (_, Value::Infinite { .. }) => {
            Exact::Special(Value::Infinite {
                negative: a.is_negative() != b.is_negative(),
            })
        },
        (Value::Zero { .. }, _) | (_, Value::Zero { .. }) => Exact::Special(Value::Zero {
            negative: a.is_negative() != b.is_negative(),
        }),
        (
            Value::Finite {
                negative: sa,
                mantissa: ma,
                exponent: ea,
            },
            Value::Finite {
                negative: sb,
                mantissa: mb,
                exponent: eb,
            },
        ) => Exact::Ratio {
            negative: sa != sb,
            num: ma * mb,
            den: BigUint::one(),
            exp2: ea + eb,
        },
    }
}

/// Exact `a / b`. Division of a non-zero value by zero gives a signed
/// infinity.
pub fn div(a: &Value, b: &Value) -> Exact {
    let negative = a.is_negative() != b.is_negative();
    match (a, b) {
        (Value::NaN, _) | (_, Value::NaN) => Exact::Special(Value::NaN),
        (Value::Infinite { .. }, Value::Infinite { .. }) | (Value::Zero { .. }, Value::Zero { .. }) => {
            Exact::Special(Value::NaN)
        },
        (Value::Infinite { .. }, _) | (_, Value::Zero { .. }) => {
            Exact::Special(Value::Infinite { negative })
        },
        (_, Value::Infinite { .. }) | (Value::Zero { .. }, _) => {
            Exact::Special(Value::Zero { negative })
        },
        (
            Value::Finite {
                mantissa: ma,
                exponent: ea,
                ..
            },
            Value::Finite {
                mantissa: mb,
                exponent: eb,
                ..
            },
        ) => Exact::Ratio {
            negative,
            num: ma.clone(),
            den: mb.clone(),
            exp2: ea - eb,
        },
    }
}

fn add_finite(
    a: (bool, &BigUint, i64),
    b: (bool, &BigUint, i64),
    precision: u32,
    rnd: RoundingMode,
) -> Exact {
    // Order so that `big` has the higher leading bit
    let top = |(_, m, e): (bool, &BigUint, i64)| e + m.bits() as i64;
    let (big, small) = if top(a) >= top(b) { (a, b) } else { (b, a) };
    let (big_neg, big_m, big_e) = big;
    let (small_neg, mut small_m, mut small_e) = (small.0, small.1.clone(), small.2);

    // Every rounding boundary of the result lies on the 2^grid lattice; an
    // operand entirely below it only decides the direction, so any value of
    // the same sign under 2^grid rounds identically
    let grid = big_e.min(top(big) - i64::from(precision) - 2);
    if top(small) < grid {
        small_m = BigUint::one();
        small_e = grid - 1;
    }

    let base = big_e.min(small_e);
    let big_aligned = big_m << ((big_e - base) as usize);
    let small_aligned = small_m << ((small_e - base) as usize);

    let (negative, num) = if big_neg == small_neg {
        (big_neg, big_aligned + small_aligned)
    } else {
        match big_aligned.cmp(&small_aligned) {
            Ordering::Greater => (big_neg, big_aligned - small_aligned),
            Ordering::Less => (small_neg, small_aligned - big_aligned),
            Ordering::Equal => {
                return Exact::Special(Value::Zero {
                    negative: rnd == RoundingMode::TowardNegative,
                })
            },
        }
    };

    Exact::Ratio {
        negative,
        num,
        den: BigUint::one(),
        exp2: base,
    }
}

// ============================================================================
// Stored Numbers
// ============================================================================

/// A number slot: fixed precision plus current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftNumber {
    precision: u32,
    value: Value,
}

impl SoftNumber {
    /// A fresh number holds NaN until assigned.
    pub fn new(precision: u32) -> Self {
        Self {
            precision,
            value: Value::NaN,
        }
    }

    #[inline]
    pub fn precision(&self) -> u32 {
        self.precision
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Round `exact` into this number.
    pub fn assign(&mut self, exact: Exact, rnd: RoundingMode) {
        self.value = exact.round(self.precision, rnd);
    }
}
