// ============================================================================
// Scratch Buffers
// Reusable engine memory for string conversions
// ============================================================================

use crate::interfaces::{MemPtr, NumericEngine};
use crate::numeric::FloatResult;

/// Size of the exponent output word
pub const EXPONENT_WORD_SIZE: usize = 4;

/// Pointer to a NUL-terminated string handed to the engine's parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringSource {
    /// Staged in the shared buffer; valid until the next conversion
    Shared(MemPtr),
    /// The text did not fit; allocated for this call only
    OneOff(MemPtr),
}

impl StringSource {
    #[inline]
    pub fn ptr(&self) -> MemPtr {
        match self {
            StringSource::Shared(ptr) | StringSource::OneOff(ptr) => *ptr,
        }
    }

    /// Free a one-off allocation once the engine is done with it.
    /// The shared buffer stays in place.
    pub fn release(self, engine: &mut dyn NumericEngine) -> FloatResult<()> {
        if let StringSource::OneOff(ptr) = self {
            engine.dealloc(ptr)?;
        }
        Ok(())
    }
}

/// One shared string buffer plus the exponent word, allocated once per
/// context and reused by every conversion.
///
/// Callers must hold the engine lock from acquiring a pointer until the
/// engine call using it has returned.
#[derive(Debug)]
pub struct ScratchBuffers {
    buffer: MemPtr,
    exponent: MemPtr,
    capacity: usize,
}

impl ScratchBuffers {
    /// Allocate the shared buffer and exponent word in engine memory.
    pub fn allocate(engine: &mut dyn NumericEngine, capacity: usize) -> FloatResult<Self> {
        let buffer = engine.malloc(capacity)?;
        let exponent = match engine.malloc(EXPONENT_WORD_SIZE) {
            Ok(ptr) => ptr,
            Err(fault) => {
                engine.dealloc(buffer)?;
                return Err(fault.into());
            },
        };

        tracing::debug!(
            "Allocated scratch buffer of {} bytes at {} (exponent word at {})",
            capacity,
            buffer,
            exponent
        );

        Ok(Self {
            buffer,
            exponent,
            capacity,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn buffer(&self) -> MemPtr {
        self.buffer
    }

    /// Word receiving the exponent of a formatted value
    #[inline]
    pub fn exponent_word(&self) -> MemPtr {
        self.exponent
    }

    /// Stage `text` plus a terminator for the engine's parser.
    pub fn acquire_string_source(
        &self,
        engine: &mut dyn NumericEngine,
        text: &str,
    ) -> FloatResult<StringSource> {
        let needed = text.len() + 1;
        let source = if needed <= self.capacity {
            StringSource::Shared(self.buffer)
        } else {
            tracing::trace!("String of {} bytes exceeds scratch buffer, allocating", needed);
            StringSource::OneOff(engine.malloc(needed)?)
        };

        let mut staged = Vec::with_capacity(needed);
        staged.extend_from_slice(text.as_bytes());
        staged.push(0);
        if let Err(fault) = engine.write_bytes(source.ptr(), &staged) {
            source.release(engine)?;
            return Err(fault.into());
        }

        Ok(source)
    }

    /// Target for a formatted string of `required` bytes: the shared buffer
    /// when it fits, otherwise NULL so the engine allocates its own.
    #[inline]
    pub fn acquire_format_target(&self, required: usize) -> MemPtr {
        if required <= self.capacity {
            self.buffer
        } else {
            MemPtr::NULL
        }
    }

    /// Return both allocations to the engine. Only called at context
    /// teardown; the pointers are dangling afterwards.
    pub(crate) fn free(&self, engine: &mut dyn NumericEngine) -> FloatResult<()> {
        engine.dealloc(self.buffer)?;
        engine.dealloc(self.exponent)?;
        Ok(())
    }
}
