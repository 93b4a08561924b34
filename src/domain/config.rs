// ============================================================================
// Context Configuration
// Defaults and scratch-buffer sizing for a float context
// ============================================================================

use super::options::{validate_precision_bits, validate_radix, DefaultOptions};
use super::rounding::RoundingMode;
use crate::numeric::{FloatError, FloatResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Capacity of the shared string scratch buffer.
pub const DEFAULT_SCRATCH_CAPACITY: usize = 2 * 1024;

/// Smallest scratch buffer that can hold any special-value token.
pub const MIN_SCRATCH_CAPACITY: usize = 8;

/// Configuration for creating a float context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContextConfig {
    /// Options every float falls back to
    pub defaults: DefaultOptions,

    /// Size of the shared string buffer in engine memory.
    /// Conversions needing more space use a one-off allocation.
    pub scratch_capacity: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultOptions::default(),
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
        }
    }
}

impl ContextConfig {
    /// Create a configuration from explicit defaults
    pub fn new(defaults: DefaultOptions) -> Self {
        Self {
            defaults,
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
        }
    }

    /// Builder method: Set default precision
    pub fn with_precision_bits(mut self, bits: u32) -> Self {
        self.defaults.precision_bits = bits;
        self
    }

    /// Builder method: Set default rounding mode
    pub fn with_rounding_mode(mut self, mode: RoundingMode) -> Self {
        self.defaults.rounding_mode = mode;
        self
    }

    /// Builder method: Set default radix
    pub fn with_radix(mut self, radix: u32) -> Self {
        self.defaults.radix = radix;
        self
    }

    /// Builder method: Set scratch buffer capacity
    pub fn with_scratch_capacity(mut self, capacity: usize) -> Self {
        self.scratch_capacity = capacity;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> FloatResult<()> {
        validate_precision_bits(self.defaults.precision_bits)?;
        validate_radix(self.defaults.radix)?;

        if self.scratch_capacity < MIN_SCRATCH_CAPACITY {
            return Err(FloatError::InvalidParameter(format!(
                "scratch capacity must be at least {} bytes, got {}",
                MIN_SCRATCH_CAPACITY, self.scratch_capacity
            )));
        }
        if u32::try_from(self.scratch_capacity).is_err() {
            return Err(FloatError::InvalidParameter(
                "scratch capacity exceeds engine address space".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Preset Configurations (Factory Methods)
// ============================================================================

impl ContextConfig {
    /// IEEE binary64-equivalent precision (53 bits)
    pub fn double() -> Self {
        Self::default()
    }

    /// IEEE binary128-equivalent precision (113 bits)
    pub fn quad() -> Self {
        Self::default().with_precision_bits(113)
    }

    /// IEEE binary256-equivalent precision (237 bits)
    pub fn octuple() -> Self {
        Self::default().with_precision_bits(237)
    }

    /// Default precision with toward-zero rounding, so every value can be
    /// rendered in truncating mode
    pub fn truncating() -> Self {
        Self::default().with_rounding_mode(RoundingMode::TowardZero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = ContextConfig::default();
        assert_eq!(config.defaults, DefaultOptions::default());
        assert_eq!(config.scratch_capacity, 2048);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = ContextConfig::default()
            .with_precision_bits(200)
            .with_radix(16)
            .with_scratch_capacity(64);

        assert_eq!(config.defaults.precision_bits, 200);
        assert_eq!(config.defaults.radix, 16);
        assert_eq!(config.scratch_capacity, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(ContextConfig::default()
            .with_precision_bits(0)
            .validate()
            .is_err());
        assert!(ContextConfig::default().with_radix(1).validate().is_err());
        assert!(ContextConfig::default()
            .with_scratch_capacity(4)
            .validate()
            .is_err());
    }

    #[test]
    fn test_preset_configs() {
        assert_eq!(ContextConfig::double().defaults.precision_bits, 53);
        assert_eq!(ContextConfig::quad().defaults.precision_bits, 113);
        assert_eq!(ContextConfig::octuple().defaults.precision_bits, 237);
        assert_eq!(
            ContextConfig::truncating().defaults.rounding_mode,
            RoundingMode::TowardZero
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_json() {
        let config = ContextConfig::quad().with_radix(16);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ContextConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
