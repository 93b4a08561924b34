// ============================================================================
// Rendering
// Post-processing of the engine's raw digit strings
// ============================================================================

/// Smallest buffer the engine's formatter accepts.
pub const MIN_FORMAT_BUFFER: usize = 7;

/// Raw engine tokens for special values and their display strings.
pub const SPECIAL_VALUES: [(&str, &str); 3] = [
    ("@NaN@", "NaN"),
    ("@Inf@", "Infinity"),
    ("-@Inf@", "-Infinity"),
];

/// Options for rendering a float as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    /// Radix override; the float's own radix when unset
    pub radix: Option<u32>,
    /// Render a fixed number of digits rounded toward zero
    pub truncate: bool,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_radix(mut self, radix: u32) -> Self {
        self.radix = Some(radix);
        self
    }

    pub fn truncated(mut self) -> Self {
        self.truncate = true;
        self
    }
}

/// Display string for a raw special-value token, if `raw` is one.
pub fn special_value(raw: &str) -> Option<&'static str> {
    SPECIAL_VALUES
        .iter()
        .find(|(token, _)| *token == raw)
        .map(|(_, display)| *display)
}

/// Digit bound used by truncating renders: `floor(prec * log2(2) / log2(radix))`.
///
/// Depends only on the precision, never on the value.
pub fn truncated_digit_count(precision_bits: u32, radix: u32) -> usize {
    let digits = (f64::from(precision_bits) * 2f64.log2()) / f64::from(radix).log2();
    digits.floor() as usize
}

/// Buffer size needed to format `digits` digits: sign, digits, terminator,
/// with a floor of [`MIN_FORMAT_BUFFER`].
#[inline]
pub fn required_buffer_size(digits: usize) -> usize {
    MIN_FORMAT_BUFFER.max(digits + 2)
}

/// Place the radix point into a raw digit string.
///
/// `point` is the engine's exponent word: the value is `0.DIGITS × radix^point`.
/// - `point <= 0`: `0.` followed by `-point` zeros and the digits
/// - `point >= digit count`: the digits padded with trailing zeros
/// - otherwise: the digits split at `point`
///
/// When a point was inserted, trailing zeros and a bare trailing point are
/// removed.
pub fn insert_radix_point(raw: &str, point: i32) -> String {
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw),
    };
    let len = digits.len() as i64;
    let point = i64::from(point);

    if point >= len {
        let zeros = "0".repeat((point - len) as usize);
        return format!("{sign}{digits}{zeros}");
    }

    let mut text = if point <= 0 {
        let zeros = "0".repeat((-point) as usize);
        format!("{sign}0.{zeros}{digits}")
    } else {
        let (int_part, frac_part) = digits.split_at(point as usize);
        format!("{sign}{int_part}.{frac_part}")
    };

    let trimmed = text.trim_end_matches('0').len();
    text.truncate(trimmed);
    if text.ends_with('.') {
        text.pop();
    }
    text
}
