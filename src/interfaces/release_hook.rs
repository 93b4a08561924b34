// ============================================================================
// Release Hook Interface
// Observes native handle retain/release events
// ============================================================================

use super::numeric_engine::RawHandle;

/// Lifecycle events for native handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A float took ownership of a freshly allocated handle
    Retained { handle: RawHandle },

    /// The handle was freed in the engine
    Released { handle: RawHandle },

    /// The engine was busy when the owner went away; the handle is queued
    /// and freed the next time the engine lock is taken
    Deferred { handle: RawHandle },
}

/// Hook notified when handles are retained and released.
/// Implementations can count, log, or audit native resources.
///
/// Hooks run while the engine lock may be held and must not call back into
/// the float API.
pub trait ReleaseHook: Send + Sync {
    /// Handle a lifecycle event
    fn on_event(&self, event: LifecycleEvent);
}

/// No-op hook
pub struct NoOpReleaseHook;

impl ReleaseHook for NoOpReleaseHook {
    fn on_event(&self, _event: LifecycleEvent) {}
}

/// Logging hook
pub struct LoggingReleaseHook;

impl ReleaseHook for LoggingReleaseHook {
    fn on_event(&self, event: LifecycleEvent) {
        tracing::debug!("Native handle lifecycle: {:?}", event);
    }
}
