// ============================================================================
// Float Context
// Owns the engine instance, scratch buffers, defaults and release queue
// ============================================================================

use super::factory::FloatContextBuilder;
use super::lifecycle::{LifecycleStats, NativeHandle, ReleaseTracker};
use super::scratch::ScratchBuffers;
use crate::domain::{ContextConfig, DefaultOptions, FloatOptions};
use crate::interfaces::{NumericEngine, RawHandle, ReleaseHook};
use crate::numeric::{Float, FloatError, FloatResult, FloatValue};
use parking_lot::Mutex;
use std::sync::Arc;

/// Engine plus its scratch buffers. Only reachable through the context
/// lock.
pub struct EngineState {
    engine: Box<dyn NumericEngine>,
    scratch: ScratchBuffers,
}

impl EngineState {
    #[inline]
    pub fn engine(&mut self) -> &mut dyn NumericEngine {
        self.engine.as_mut()
    }

    /// Engine and scratch buffers borrowed together
    #[inline]
    pub fn parts(&mut self) -> (&mut dyn NumericEngine, &ScratchBuffers) {
        (self.engine.as_mut(), &self.scratch)
    }
}

/// Shared state behind every float of one engine instance.
///
/// Floats keep the context alive through an `Arc`, so the engine outlives
/// every handle it issued. All engine calls are serialized by one lock.
pub struct FloatContext {
    state: Mutex<EngineState>,
    tracker: ReleaseTracker,
    defaults: DefaultOptions,
    engine_name: String,
}

impl FloatContext {
    /// Create a context around `engine`.
    ///
    /// Allocates the scratch buffers in engine memory.
    pub fn new(
        mut engine: Box<dyn NumericEngine>,
        config: ContextConfig,
        hook: Arc<dyn ReleaseHook>,
    ) -> FloatResult<Arc<Self>> {
        config.validate()?;
        let scratch = ScratchBuffers::allocate(engine.as_mut(), config.scratch_capacity)?;
        let engine_name = engine.name().to_string();

        tracing::debug!(
            "Created float context on engine '{}' (precision {} bits, rounding {}, radix {})",
            engine_name,
            config.defaults.precision_bits,
            config.defaults.rounding_mode,
            config.defaults.radix
        );

        Ok(Arc::new(Self {
            state: Mutex::new(EngineState { engine, scratch }),
            tracker: ReleaseTracker::new(hook),
            defaults: config.defaults,
            engine_name,
        }))
    }

    /// Context on the in-process engine with default configuration
    pub fn with_soft_engine() -> FloatResult<Arc<Self>> {
        FloatContextBuilder::new().build_soft()
    }

    pub fn builder() -> FloatContextBuilder {
        FloatContextBuilder::new()
    }

    #[inline]
    pub fn defaults(&self) -> &DefaultOptions {
        &self.defaults
    }

    #[inline]
    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }

    pub fn scratch_capacity(&self) -> usize {
        self.state.lock().scratch.capacity()
    }

    /// Lifecycle counters
    pub fn stats(&self) -> LifecycleStats {
        self.tracker.stats()
    }

    /// Free every queued release now. Returns the number freed.
    pub fn collect(&self) -> usize {
        let mut state = self.state.lock();
        self.tracker.drain(state.engine())
    }

    /// Construct a float that follows the context defaults.
    pub fn float<'a>(self: &Arc<Self>, value: impl Into<FloatValue<'a>>) -> FloatResult<Float> {
        Float::new(self, value, None)
    }

    /// Construct a float with explicit options.
    pub fn float_with<'a>(
        self: &Arc<Self>,
        value: impl Into<FloatValue<'a>>,
        options: FloatOptions,
    ) -> FloatResult<Float> {
        Float::new(self, value, Some(options))
    }

    // ========================================================================
    // Crate-internal engine access
    // ========================================================================

    /// Run `f` with the engine lock held. Queued releases are drained before
    /// and after `f`.
    pub(crate) fn with_engine<T>(
        &self,
        f: impl FnOnce(&mut EngineState) -> FloatResult<T>,
    ) -> FloatResult<T> {
        let mut state = self.state.lock();
        self.tracker.drain(state.engine());
        let result = f(&mut state);
        self.tracker.drain(state.engine());
        result
    }

    /// Allocate a handle with `precision_bits` and wrap it. The caller holds
    /// the engine lock.
    pub(crate) fn allocate_handle(
        self: &Arc<Self>,
        state: &mut EngineState,
        precision_bits: u32,
    ) -> FloatResult<NativeHandle> {
        let engine = state.engine();
        let raw = engine.alloc()?;
        if let Err(fault) = engine.set_precision(raw, precision_bits) {
            if let Err(free_fault) = engine.free(raw) {
                tracing::error!("Failed to free uninitialized handle {}: {}", raw, free_fault);
            }
            return Err(fault.into());
        }

        self.tracker.retained(raw);
        Ok(NativeHandle::new(raw, Arc::clone(self)))
    }

    /// Fail unless `float` was created by this context.
    pub(crate) fn check_owner(self: &Arc<Self>, float: &Float) -> FloatResult<()> {
        if Arc::ptr_eq(self, float.context()) {
            Ok(())
        } else {
            Err(FloatError::InvalidParameter(format!(
                "float belongs to another context (engine '{}')",
                float.context().engine_name()
            )))
        }
    }

    /// Eager release: waits for the lock.
    pub(crate) fn release_handle(&self, raw: RawHandle) -> FloatResult<()> {
        self.with_engine(|state| self.tracker.release(state.engine(), raw))
    }

    /// Release from `Drop`: frees immediately if the engine is idle,
    /// otherwise queues the handle.
    pub(crate) fn release_or_defer(&self, raw: RawHandle) {
        match self.state.try_lock() {
            Some(mut state) => {
                // Failures are logged and counted by the tracker
                let _ = self.tracker.release(state.engine(), raw);
            },
            None => self.tracker.defer(raw),
        }
    }
}

impl Drop for FloatContext {
    fn drop(&mut self) {
        let state = self.state.get_mut();

        let pending = self.tracker.pending();
        if pending > 0 {
            tracing::warn!(
                "Releasing {} deferred native handles at context teardown",
                pending
            );
            self.tracker.drain(state.engine.as_mut());
        }

        if let Err(error) = state.scratch.free(state.engine.as_mut()) {
            tracing::error!("Failed to free scratch buffers: {}", error);
        }
        tracing::debug!("Dropped float context on engine '{}'", self.engine_name);
    }
}

impl std::fmt::Debug for FloatContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloatContext")
            .field("engine", &self.engine_name)
            .field("defaults", &self.defaults)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::soft::SoftEngine;
    use crate::interfaces::NoOpReleaseHook;

    #[test]
    fn test_context_creation() {
        let context = FloatContext::with_soft_engine().unwrap();
        assert_eq!(context.engine_name(), "soft");
        assert_eq!(context.defaults(), &DefaultOptions::default());
        assert_eq!(context.scratch_capacity(), 2048);
        assert_eq!(context.stats(), LifecycleStats::default());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ContextConfig::default().with_precision_bits(0);
        let result = FloatContext::new(
            Box::new(SoftEngine::new()),
            config,
            Arc::new(NoOpReleaseHook),
        );
        assert!(matches!(result, Err(FloatError::InvalidParameter(_))));
    }

    #[test]
    fn test_scratch_allocation_failure_is_fatal() {
        let result = FloatContext::new(
            Box::new(SoftEngine::with_memory_limit(1024)),
            ContextConfig::default(),
            Arc::new(NoOpReleaseHook),
        );
        assert!(matches!(result, Err(FloatError::FatalEngineCondition(_))));
    }

    #[test]
    fn test_bad_precision_frees_reserved_handle() {
        let context = FloatContext::with_soft_engine().unwrap();
        let result = context.with_engine(|state| context.allocate_handle(state, 0));
        assert!(matches!(result, Err(FloatError::FatalEngineCondition(_))));
        assert_eq!(context.stats().allocated, 0);
    }

    #[test]
    fn test_foreign_float_rejected() {
        let a = FloatContext::with_soft_engine().unwrap();
        let b = FloatContext::with_soft_engine().unwrap();
        let x = b.float(1).unwrap();
        assert!(matches!(
            a.check_owner(&x),
            Err(FloatError::InvalidParameter(_))
        ));
        assert!(b.check_owner(&x).is_ok());
    }

    #[test]
    fn test_collect_frees_queued_handles() {
        let context = FloatContext::with_soft_engine().unwrap();
        let handle = context
            .with_engine(|state| context.allocate_handle(state, 53))
            .unwrap();

        {
            let _guard = context.state.lock();
            drop(handle);
        }
        assert_eq!(context.stats().pending, 1);
        assert_eq!(context.collect(), 1);
        assert_eq!(context.stats().live(), 0);
    }
}
