// ============================================================================
// Arbitrary-Precision Float Bridge
// Handle-based floats over a foreign numeric engine
// ============================================================================

//! # apfloat-bridge
//!
//! Arbitrary-precision binary floats whose arithmetic runs in an opaque
//! numeric engine reachable only through integer handles and a linear byte
//! memory.
//!
//! ## Features
//!
//! - **Exactly-once handle release** on drop, with a lock-free queue for
//!   releases that happen while the engine is busy
//! - **Per-value options** (precision, rounding mode, radix) with a
//!   deterministic merge policy for binary operations
//! - **Shared scratch buffers** for string conversion, with one-off
//!   allocations for oversized strings
//! - **Pluggable engines** behind the [`interfaces::NumericEngine`] trait,
//!   plus an in-process [`engine::SoftEngine`]
//!
//! ## Example
//!
//! ```rust
//! use apfloat_bridge::prelude::*;
//!
//! let context = FloatContext::with_soft_engine().unwrap();
//!
//! let a = context.float("1.5").unwrap();
//! let b = context
//!     .float_with(3, FloatOptions::new().with_precision_bits(113))
//!     .unwrap();
//!
//! let sum = a.add(&b).unwrap();
//! assert_eq!(sum.precision_bits(), 113);
//! assert_eq!(sum.to_string(), "4.5");
//!
//! let third = context.float(1).unwrap().div(3).unwrap();
//! println!("1/3 = {}", third);
//! ```

pub mod domain;
pub mod engine;
pub mod interfaces;
pub mod numeric;
pub mod utils;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        ContextConfig, DefaultOptions, FloatOptions, RenderOptions, ResolvedOptions, RoundingMode,
    };
    pub use crate::engine::{
        create_from_config, FloatContext, FloatContextBuilder, LifecycleStats, SoftEngine,
    };
    pub use crate::interfaces::{
        LifecycleEvent, LoggingReleaseHook, NoOpReleaseHook, NumericEngine, ReleaseHook,
    };
    pub use crate::numeric::{Float, FloatError, FloatResult, FloatValue, Operand};
}
