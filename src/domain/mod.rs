// ============================================================================
// Domain Models Module
// Options, rounding, configuration and rendering rules
// ============================================================================

pub mod config;
pub mod options;
pub mod render;
pub mod rounding;

pub use config::{ContextConfig, DEFAULT_SCRATCH_CAPACITY};
pub use options::{
    validate_precision_bits, validate_radix, DefaultOptions, FloatOptions, ResolvedOptions,
    MAX_PRECISION_BITS, MAX_RADIX, MIN_PRECISION_BITS, MIN_RADIX,
};
pub use render::RenderOptions;
pub use rounding::RoundingMode;
