// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod numeric_engine;
mod release_hook;

pub use numeric_engine::{EngineFault, EngineResult, MemPtr, NumericEngine, RawHandle};
pub use release_hook::{LifecycleEvent, LoggingReleaseHook, NoOpReleaseHook, ReleaseHook};
