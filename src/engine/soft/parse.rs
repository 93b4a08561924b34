// ============================================================================
// Literal Parsing
// Numeric strings in radix 2..=36 to exact values
// ============================================================================

use super::number::{Exact, Value};
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Radix exponents beyond this magnitude saturate to infinity or zero.
pub const MAX_RADIX_EXPONENT: i64 = 1_000_000;

/// Binary exponents beyond this magnitude saturate to infinity or zero.
pub const MAX_BINARY_EXPONENT: i64 = 4 * MAX_RADIX_EXPONENT;

/// Parse a complete literal.
///
/// Accepted: optional leading whitespace, a sign, `@nan@` / `@inf@` in any
/// radix (and `nan`, `inf`, `infinity` up to radix 16), a `0x` / `0b`
/// prefix in radix 16 / 2, digits with at most one point, and an exponent
/// introduced by `e` (radix <= 10), `@` (any radix, power of the radix) or
/// `p` (radix 2 and 16, power of two). Returns `None` unless the whole
/// string matches.
pub fn parse_literal(text: &str, radix: u32) -> Option<Exact> {
    let text = text.trim_start();
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    if let Some(special) = parse_special(body, radix, negative) {
        return Some(Exact::Special(special));
    }

    let body = strip_radix_prefix(body, radix);
    let bytes = body.as_bytes();

    let mut digits = BigUint::zero();
    let mut fraction_digits: i64 = 0;
    let mut seen_digit = false;
    let mut seen_point = false;
    let mut index = 0;

    while let Some(&c) = bytes.get(index) {
        if c == b'.' {
            if seen_point {
                return None;
            }
            seen_point = true;
        } else if let Some(d) = digit_value(c, radix) {
            digits = digits * radix + d;
            seen_digit = true;
            if seen_point {
                fraction_digits += 1;
            }
        } else {
            break;
        }
        index += 1;
    }

    if !seen_digit {
        return None;
    }

    let mut radix_exponent: i64 = 0;
    let mut binary_exponent: i64 = 0;
    if let Some(&marker) = bytes.get(index) {
        let binary = match marker {
            b'e' | b'E' if radix <= 10 => false,
            b'@' => false,
            b'p' | b'P' if radix == 2 || radix == 16 => true,
            _ => return None,
        };
        let exponent = parse_exponent(&body[index + 1..])?;
        if binary {
            binary_exponent = exponent;
        } else {
            radix_exponent = exponent;
        }
    }

    if digits.is_zero() {
        return Some(Exact::Special(Value::Zero { negative }));
    }

    let scale = radix_exponent.saturating_sub(fraction_digits);
    if scale > MAX_RADIX_EXPONENT || binary_exponent > MAX_BINARY_EXPONENT {
        return Some(Exact::Special(Value::Infinite { negative }));
    }
    if scale < -MAX_RADIX_EXPONENT || binary_exponent < -MAX_BINARY_EXPONENT {
        return Some(Exact::Special(Value::Zero { negative }));
    }

    let base = BigUint::from(radix);
    let power = base.pow(scale.unsigned_abs() as u32);
    let (num, den) = if scale >= 0 {
        (digits * power, BigUint::one())
    } else {
        (digits, power)
    };

    Some(Exact::Ratio {
        negative,
        num,
        den,
        exp2: binary_exponent,
    })
}

fn parse_special(body: &str, radix: u32, negative: bool) -> Option<Value> {
    let lower = body.to_ascii_lowercase();
    let is_nan = lower == "@nan@" || (radix <= 16 && lower == "nan");
    let is_inf =
        lower == "@inf@" || (radix <= 16 && (lower == "inf" || lower == "infinity"));

    if is_nan {
        Some(Value::NaN)
    } else if is_inf {
        Some(Value::Infinite { negative })
    } else {
        None
    }
}

fn strip_radix_prefix(body: &str, radix: u32) -> &str {
    let prefixes: &[&str] = match radix {
        16 => &["0x", "0X"],
        2 => &["0b", "0B"],
        _ => &[],
    };
    for prefix in prefixes {
        if let Some(rest) = body.strip_prefix(prefix) {
            // A bare prefix is not a literal; keep the leading zero as a digit
            if !rest.is_empty() {
                return rest;
            }
        }
    }
    body
}

fn digit_value(c: u8, radix: u32) -> Option<u32> {
    (c as char).to_digit(radix)
}

/// Decimal exponent: optional sign, at least one digit, nothing after.
/// Saturates instead of overflowing.
fn parse_exponent(text: &str) -> Option<i64> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let magnitude = digits.bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}
