// ============================================================================
// Context Factory
// Creates float contexts with proper configuration
// ============================================================================

use super::context::FloatContext;
use super::soft::SoftEngine;
use crate::domain::{ContextConfig, RoundingMode};
use crate::interfaces::{NoOpReleaseHook, NumericEngine, ReleaseHook};
use crate::numeric::FloatResult;
use std::sync::Arc;

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates a float context from configuration
///
/// # Arguments
/// * `config` - Defaults and scratch buffer sizing
/// * `engine` - Numeric engine instance the context takes ownership of
/// * `hook` - Observer for handle retain/release events
///
/// # Example
/// ```
/// use apfloat_bridge::prelude::*;
/// use std::sync::Arc;
///
/// let context = create_from_config(
///     ContextConfig::quad(),
///     Box::new(SoftEngine::new()),
///     Arc::new(NoOpReleaseHook),
/// )
/// .unwrap();
/// assert_eq!(context.defaults().precision_bits, 113);
/// ```
pub fn create_from_config(
    config: ContextConfig,
    engine: Box<dyn NumericEngine>,
    hook: Arc<dyn ReleaseHook>,
) -> FloatResult<Arc<FloatContext>> {
    FloatContext::new(engine, config, hook)
}

// ============================================================================
// Builder Pattern for Advanced Configuration
// ============================================================================

/// Builder for creating float contexts with fluent API
///
/// # Example
/// ```
/// use apfloat_bridge::prelude::*;
///
/// let context = FloatContextBuilder::new()
///     .with_precision_bits(200)
///     .with_rounding_mode(RoundingMode::TowardZero)
///     .build_soft()
///     .unwrap();
/// assert_eq!(context.defaults().precision_bits, 200);
/// ```
pub struct FloatContextBuilder {
    config: ContextConfig,
    hook: Arc<dyn ReleaseHook>,
}

impl Default for FloatContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FloatContextBuilder {
    /// Create a builder with default configuration and no release hook
    pub fn new() -> Self {
        Self {
            config: ContextConfig::default(),
            hook: Arc::new(NoOpReleaseHook),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: ContextConfig) -> Self {
        Self {
            config,
            hook: Arc::new(NoOpReleaseHook),
        }
    }

    // ========================================================================
    // Default Options
    // ========================================================================

    /// Set the default precision in bits
    pub fn with_precision_bits(mut self, bits: u32) -> Self {
        self.config = self.config.with_precision_bits(bits);
        self
    }

    /// Set the default rounding mode
    pub fn with_rounding_mode(mut self, mode: RoundingMode) -> Self {
        self.config = self.config.with_rounding_mode(mode);
        self
    }

    /// Set the default radix
    pub fn with_radix(mut self, radix: u32) -> Self {
        self.config = self.config.with_radix(radix);
        self
    }

    // ========================================================================
    // Resources
    // ========================================================================

    /// Set the shared string buffer capacity
    pub fn with_scratch_capacity(mut self, capacity: usize) -> Self {
        self.config = self.config.with_scratch_capacity(capacity);
        self
    }

    /// Observe handle lifecycle events
    pub fn with_release_hook(mut self, hook: Arc<dyn ReleaseHook>) -> Self {
        self.hook = hook;
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build a context around `engine`
    pub fn build(self, engine: Box<dyn NumericEngine>) -> FloatResult<Arc<FloatContext>> {
        create_from_config(self.config, engine, self.hook)
    }

    /// Build a context around a fresh in-process engine
    pub fn build_soft(self) -> FloatResult<Arc<FloatContext>> {
        self.build(Box::new(SoftEngine::new()))
    }

    /// Get the configuration without building (for inspection)
    pub fn get_config(&self) -> &ContextConfig {
        &self.config
    }
}
