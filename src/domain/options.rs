// ============================================================================
// Float Options
// Per-value precision, rounding and radix settings, plus the merge policy
// ============================================================================

use super::rounding::RoundingMode;
use crate::numeric::{FloatError, FloatResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest precision the engine accepts.
pub const MIN_PRECISION_BITS: u32 = 1;

/// Largest precision accepted by this crate.
pub const MAX_PRECISION_BITS: u32 = 1 << 24;

/// Smallest supported radix.
pub const MIN_RADIX: u32 = 2;

/// Largest supported radix (digits `0-9a-z`).
pub const MAX_RADIX: u32 = 36;

/// Check that a precision lies in the supported range.
pub fn validate_precision_bits(bits: u32) -> FloatResult<()> {
    if (MIN_PRECISION_BITS..=MAX_PRECISION_BITS).contains(&bits) {
        Ok(())
    } else {
        Err(FloatError::InvalidParameter(format!(
            "precision must be between {} and {} bits, got {}",
            MIN_PRECISION_BITS, MAX_PRECISION_BITS, bits
        )))
    }
}

/// Check that a radix lies in the supported range.
pub fn validate_radix(radix: u32) -> FloatResult<()> {
    if (MIN_RADIX..=MAX_RADIX).contains(&radix) {
        Ok(())
    } else {
        Err(FloatError::InvalidParameter(format!(
            "radix must be between {} and {}, got {}",
            MIN_RADIX, MAX_RADIX, radix
        )))
    }
}

// ============================================================================
// Explicit Options
// ============================================================================

/// Options explicitly attached to a float.
///
/// Unset fields follow the context's [`DefaultOptions`]. A float created
/// without options stores none at all and tracks the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FloatOptions {
    /// Working precision in bits
    pub precision_bits: Option<u32>,
    /// Rounding mode for every operation producing or performed on the value
    pub rounding_mode: Option<RoundingMode>,
    /// Default radix for parsing and rendering
    pub radix: Option<u32>,
}

impl FloatOptions {
    /// Options with every field unset.
    pub const fn new() -> Self {
        Self {
            precision_bits: None,
            rounding_mode: None,
            radix: None,
        }
    }

    /// Builder method: set precision in bits
    pub fn with_precision_bits(mut self, bits: u32) -> Self {
        self.precision_bits = Some(bits);
        self
    }

    /// Builder method: set rounding mode
    pub fn with_rounding_mode(mut self, mode: RoundingMode) -> Self {
        self.rounding_mode = Some(mode);
        self
    }

    /// Builder method: set radix
    pub fn with_radix(mut self, radix: u32) -> Self {
        self.radix = Some(radix);
        self
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.precision_bits.is_none() && self.rounding_mode.is_none() && self.radix.is_none()
    }

    /// Validate the fields that are set.
    pub fn validate(&self) -> FloatResult<()> {
        if let Some(bits) = self.precision_bits {
            validate_precision_bits(bits)?;
        }
        if let Some(radix) = self.radix {
            validate_radix(radix)?;
        }
        Ok(())
    }
}

// ============================================================================
// Resolved Options
// ============================================================================

/// Options with every field filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedOptions {
    pub precision_bits: u32,
    pub rounding_mode: RoundingMode,
    pub radix: u32,
}

// ============================================================================
// Process-wide Defaults
// ============================================================================

/// Defaults supplied once when a context is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DefaultOptions {
    pub precision_bits: u32,
    pub rounding_mode: RoundingMode,
    pub radix: u32,
}

impl Default for DefaultOptions {
    fn default() -> Self {
        Self {
            precision_bits: 53,
            rounding_mode: RoundingMode::NearestTiesEven,
            radix: 10,
        }
    }
}

impl DefaultOptions {
    /// Validate the defaults.
    pub fn validate(&self) -> FloatResult<()> {
        validate_precision_bits(self.precision_bits)?;
        validate_radix(self.radix)
    }

    /// Fill unset fields from the defaults.
    ///
    /// # Errors
    /// Returns `InvalidParameter` if an explicit field is out of range.
    pub fn resolve(&self, options: Option<&FloatOptions>) -> FloatResult<ResolvedOptions> {
        if let Some(options) = options {
            options.validate()?;
        }
        Ok(self.fill(options))
    }

    /// Fill unset fields from the defaults without validating.
    /// For options that were validated when they were attached.
    pub fn fill(&self, options: Option<&FloatOptions>) -> ResolvedOptions {
        match options {
            Some(options) => ResolvedOptions {
                precision_bits: options.precision_bits.unwrap_or(self.precision_bits),
                rounding_mode: options.rounding_mode.unwrap_or(self.rounding_mode),
                radix: options.radix.unwrap_or(self.radix),
            },
            None => self.as_resolved(),
        }
    }

    /// The defaults as a resolved record.
    #[inline]
    pub fn as_resolved(&self) -> ResolvedOptions {
        ResolvedOptions {
            precision_bits: self.precision_bits,
            rounding_mode: self.rounding_mode,
            radix: self.radix,
        }
    }

    /// Combine two operands' options into the options of their result.
    ///
    /// - precision: the larger of the two resolved precisions
    /// - rounding mode and radix: right operand, then left, then default
    ///
    /// Returns `None` when neither operand carries options, so the result
    /// keeps following the defaults.
    pub fn merge(&self, a: Option<&FloatOptions>, b: Option<&FloatOptions>) -> Option<FloatOptions> {
        if a.is_none() && b.is_none() {
            return None;
        }

        let precision_a = a.and_then(|o| o.precision_bits).unwrap_or(self.precision_bits);
        let precision_b = b.and_then(|o| o.precision_bits).unwrap_or(self.precision_bits);

        Some(FloatOptions {
            precision_bits: Some(precision_a.max(precision_b)),
            rounding_mode: Some(
                b.and_then(|o| o.rounding_mode)
                    .or_else(|| a.and_then(|o| o.rounding_mode))
                    .unwrap_or(self.rounding_mode),
            ),
            radix: Some(
                b.and_then(|o| o.radix)
                    .or_else(|| a.and_then(|o| o.radix))
                    .unwrap_or(self.radix),
            ),
        })
    }
}
