// ============================================================================
// Digit Formatting
// Significant digits in radix 2..=36 with a radix exponent
// ============================================================================

use super::number::Value;
use crate::domain::RoundingMode;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Formatted digits. Inline up to typical double and quad precisions.
pub type DigitBuf = SmallVec<[u8; 64]>;

/// Digits needed in `radix` for a `precision` bit value to survive a
/// render/parse round trip.
///
/// `1 + ceil((p - 1) / k)` for `radix = 2^k`, `1 + ceil(p × log(2) / log(radix))`
/// otherwise.
pub fn digit_count(radix: u32, precision: u32) -> usize {
    if radix.is_power_of_two() {
        let k = radix.trailing_zeros();
        return 1 + precision.saturating_sub(1).div_ceil(k) as usize;
    }
    let digits = f64::from(precision) * std::f64::consts::LN_2 / f64::from(radix).ln();
    1 + digits.ceil() as usize
}

/// Render `value` as `n` significant digits.
///
/// Returns the digit bytes (with a leading `-` for negative values) and the
/// exponent `E` such that the value is `0.DIGITS × radix^E`. Specials render
/// as `@NaN@`, `@Inf@` and `-@Inf@` with exponent 0; zero renders as `n`
/// zeros.
pub fn to_digits(value: &Value, radix: u32, n: usize, rnd: RoundingMode) -> (DigitBuf, i64) {
    let mut out = DigitBuf::new();
    match value {
        Value::NaN => {
            out.extend_from_slice(b"@NaN@");
            (out, 0)
        },
        Value::Infinite { negative } => {
            if *negative {
                out.push(b'-');
            }
            out.extend_from_slice(b"@Inf@");
            (out, 0)
        },
        Value::Zero { negative } => {
            if *negative {
                out.push(b'-');
            }
            out.extend(std::iter::repeat_n(b'0', n));
            (out, 0)
        },
        Value::Finite {
            negative,
            mantissa,
            exponent,
        } => {
            let (digits, point) = finite_digits(*negative, mantissa, *exponent, radix, n, rnd);
            if *negative {
                out.push(b'-');
            }
            out.extend_from_slice(digits.as_bytes());
            (out, point)
        },
    }
}

fn finite_digits(
    negative: bool,
    mantissa: &BigUint,
    exponent: i64,
    radix: u32,
    n: usize,
    rnd: RoundingMode,
) -> (String, i64) {
    let n = n.max(1);
    // |x| = num / den
    let (num, den) = if exponent >= 0 {
        (mantissa << (exponent as usize), BigUint::one())
    } else {
        (mantissa.clone(), BigUint::one() << ((-exponent) as usize))
    };

    // Find E with radix^(E-1) <= |x| < radix^E, starting from an estimate
    let log2 = exponent as f64 + mantissa.bits() as f64;
    let mut point = (log2 * std::f64::consts::LN_2 / f64::from(radix).ln()).ceil() as i64;
    while compare_power(&num, &den, radix, point) != Ordering::Less {
        point += 1;
    }
    while compare_power(&num, &den, radix, point - 1) == Ordering::Less {
        point -= 1;
    }

    // N = round(|x| × radix^(n - E))
    let shift = n as i64 - point;
    let scale = BigUint::from(radix).pow(shift.unsigned_abs() as u32);
    let (num, den) = if shift >= 0 {
        (num * scale, den)
    } else {
        (num, den * scale)
    };

    let mut digits = &num / &den;
    let remainder = &num % &den;
    let half = (&remainder << 1usize).cmp(&den);
    let odd = !(&digits % 2u32).is_zero();
    if rnd.rounds_up(negative, !remainder.is_zero(), half, odd) {
        digits += 1u32;
        if digits == BigUint::from(radix).pow(n as u32) {
            digits = BigUint::from(radix).pow(n as u32 - 1);
            point += 1;
        }
    }

    (digits.to_str_radix(radix), point)
}

/// Ordering of `num / den` against `radix^power`.
fn compare_power(num: &BigUint, den: &BigUint, radix: u32, power: i64) -> Ordering {
    let scale = BigUint::from(radix).pow(power.unsigned_abs() as u32);
    if power >= 0 {
        num.cmp(&(den * scale))
    } else {
        (num * scale).cmp(den)
    }
}
