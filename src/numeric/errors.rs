// ============================================================================
// Float Errors
// Error types for float construction, arithmetic and rendering
// ============================================================================

use crate::domain::RoundingMode;
use crate::interfaces::EngineFault;
use std::fmt;

/// Errors raised by float operations.
///
/// None of these are retried: parsing and arithmetic are deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloatError {
    /// Unsupported operand, foreign-context float, or out-of-range option
    InvalidParameter(String),
    /// The engine rejected a numeric literal
    InvalidLiteral(String),
    /// Truncating render requested for a value not rounding toward zero
    UnsupportedRoundingForTruncate(RoundingMode),
    /// The numeric engine signalled an unrecoverable condition
    FatalEngineCondition(String),
}

impl FloatError {
    /// Returns true for failures raised by the engine rather than the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FloatError::FatalEngineCondition(_))
    }
}

impl fmt::Display for FloatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloatError::InvalidParameter(reason) => write!(f, "invalid parameter: {}", reason),
            FloatError::InvalidLiteral(literal) => {
                write!(f, "invalid numeric literal: {:?}", literal)
            },
            FloatError::UnsupportedRoundingForTruncate(mode) => write!(
                f,
                "truncating render requires toward-zero rounding, value uses {}",
                mode
            ),
            FloatError::FatalEngineCondition(message) => {
                write!(f, "fatal numeric engine condition: {}", message)
            },
        }
    }
}

impl std::error::Error for FloatError {}

impl From<EngineFault> for FloatError {
    fn from(fault: EngineFault) -> Self {
        FloatError::FatalEngineCondition(fault.to_string())
    }
}

/// Result type alias for float operations
pub type FloatResult<T> = Result<T, FloatError>;
