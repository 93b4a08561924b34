// ============================================================================
// Engine Module
// Engine ownership, handle lifecycle and scratch memory
// ============================================================================

mod context;
mod lifecycle;
mod scratch;

pub mod factory;
pub mod soft;

pub use context::{EngineState, FloatContext};
pub use factory::{create_from_config, FloatContextBuilder};
pub use lifecycle::{LifecycleStats, NativeHandle};
pub use scratch::{ScratchBuffers, StringSource, EXPONENT_WORD_SIZE};
pub use soft::SoftEngine;
