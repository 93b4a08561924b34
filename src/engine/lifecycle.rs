// ============================================================================
// Handle Lifecycle
// Exactly-once release of native handles
// ============================================================================
//
// A NativeHandle owns one engine handle. Dropping it releases the handle,
// or queues it when the engine lock is taken, so release never blocks and
// never re-enters the engine. The queue is drained by whoever takes the
// lock next.

use super::context::FloatContext;
use crate::interfaces::{LifecycleEvent, NumericEngine, RawHandle, ReleaseHook};
use crate::numeric::{FloatError, FloatResult};
use crossbeam::queue::SegQueue;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Snapshot of handle lifecycle counters for one context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifecycleStats {
    /// Handles allocated and retained by a float
    pub allocated: u64,
    /// Handles freed in the engine
    pub released: u64,
    /// Releases that had to be queued because the engine was busy
    pub deferred: u64,
    /// Queued handles not yet freed
    pub pending: u64,
    /// Frees the engine rejected
    pub failed: u64,
}

impl LifecycleStats {
    /// Handles currently owned by live floats or awaiting release
    #[inline]
    pub fn live(&self) -> u64 {
        self.allocated.saturating_sub(self.released + self.failed)
    }
}

// ============================================================================
// Release Tracker
// ============================================================================

/// Per-context release bookkeeping: the deferred queue, counters and hook.
pub(crate) struct ReleaseTracker {
    pending: SegQueue<RawHandle>,
    hook: Arc<dyn ReleaseHook>,
    allocated: AtomicU64,
    released: AtomicU64,
    deferred: AtomicU64,
    failed: AtomicU64,
}

impl ReleaseTracker {
    pub(crate) fn new(hook: Arc<dyn ReleaseHook>) -> Self {
        Self {
            pending: SegQueue::new(),
            hook,
            allocated: AtomicU64::new(0),
            released: AtomicU64::new(0),
            deferred: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub(crate) fn retained(&self, handle: RawHandle) {
        self.allocated.fetch_add(1, Ordering::Relaxed);
        tracing::trace!("Retained native handle {}", handle);
        self.hook.on_event(LifecycleEvent::Retained { handle });
    }

    /// Free `handle` now. The caller holds the engine lock.
    pub(crate) fn release(
        &self,
        engine: &mut dyn NumericEngine,
        handle: RawHandle,
    ) -> FloatResult<()> {
        match engine.free(handle) {
            Ok(()) => {
                self.released.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Released native handle {}", handle);
                self.hook.on_event(LifecycleEvent::Released { handle });
                Ok(())
            },
            Err(fault) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Failed to release native handle {}: {}", handle, fault);
                Err(FloatError::from(fault))
            },
        }
    }

    /// Queue `handle` for the next lock holder.
    pub(crate) fn defer(&self, handle: RawHandle) {
        self.deferred.fetch_add(1, Ordering::Relaxed);
        tracing::trace!("Engine busy, deferring release of native handle {}", handle);
        self.hook.on_event(LifecycleEvent::Deferred { handle });
        self.pending.push(handle);
    }

    /// Free every queued handle. Returns how many were taken off the queue.
    pub(crate) fn drain(&self, engine: &mut dyn NumericEngine) -> usize {
        let mut drained = 0;
        while let Some(handle) = self.pending.pop() {
            // Failures are logged and counted by `release`
            let _ = self.release(engine, handle);
            drained += 1;
        }
        drained
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn stats(&self) -> LifecycleStats {
        LifecycleStats {
            allocated: self.allocated.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            deferred: self.deferred.load(Ordering::Relaxed),
            pending: self.pending.len() as u64,
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// Native Handle
// ============================================================================

/// Owning wrapper around an engine handle.
///
/// The handle is released exactly once: eagerly through
/// [`NativeHandle::release`], or when the wrapper is dropped. After an eager
/// release the wrapper is inert.
pub struct NativeHandle {
    raw: Option<RawHandle>,
    context: Arc<FloatContext>,
}

impl NativeHandle {
    pub(crate) fn new(raw: RawHandle, context: Arc<FloatContext>) -> Self {
        Self {
            raw: Some(raw),
            context,
        }
    }

    /// The engine handle, unless already released.
    pub fn raw(&self) -> FloatResult<RawHandle> {
        self.raw.ok_or_else(|| {
            FloatError::FatalEngineCondition("native handle used after release".to_string())
        })
    }

    /// Context whose engine issued the handle
    #[inline]
    pub fn context(&self) -> &Arc<FloatContext> {
        &self.context
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.raw.is_none()
    }

    /// Release the handle now, waiting for the engine lock.
    /// Does nothing when already released.
    pub fn release(&mut self) -> FloatResult<()> {
        match self.raw.take() {
            Some(raw) => self.context.release_handle(raw),
            None => Ok(()),
        }
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.context.release_or_defer(raw);
        }
    }
}

impl std::fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeHandle")
            .field("raw", &self.raw)
            .field("engine", &self.context.engine_name())
            .finish()
    }
}
