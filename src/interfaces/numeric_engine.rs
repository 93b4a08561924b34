// ============================================================================
// Numeric Engine Interface
// Flat handle/linear-memory contract of the foreign arbitrary-precision engine
// ============================================================================

use crate::domain::RoundingMode;
use std::fmt;

/// Opaque identifier of a native number, meaningful only to the engine
/// instance that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(u32);

impl RawHandle {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Byte offset into the engine's linear memory. Offset 0 is NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemPtr(u32);

impl MemPtr {
    /// The null pointer, used to ask the engine to allocate on its own
    pub const NULL: MemPtr = MemPtr(0);

    #[inline]
    pub const fn new(offset: u32) -> Self {
        Self(offset)
    }

    #[inline]
    pub const fn offset(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Pointer `bytes` past this one, if it stays addressable.
    #[inline]
    pub fn checked_add(self, bytes: usize) -> Option<MemPtr> {
        u32::try_from(bytes)
            .ok()
            .and_then(|b| self.0.checked_add(b))
            .map(MemPtr)
    }
}

impl fmt::Display for MemPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Unrecoverable condition signalled by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFault {
    message: String,
}

impl EngineFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for EngineFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EngineFault {}

/// Result type alias for engine calls
pub type EngineResult<T> = Result<T, EngineFault>;

/// Contract of the foreign numeric engine.
///
/// Every handle-accepting call faults on a handle that was never allocated
/// or was already freed; callers must never present one. Arithmetic writes
/// into `dst`, which must have been given a precision first.
pub trait NumericEngine: Send {
    /// Engine name for logging
    fn name(&self) -> &str;

    // ------------------------------------------------------------------------
    // Linear memory
    // ------------------------------------------------------------------------

    /// Allocate `size` bytes of engine memory.
    fn malloc(&mut self, size: usize) -> EngineResult<MemPtr>;

    /// Release memory obtained from [`NumericEngine::malloc`].
    fn dealloc(&mut self, ptr: MemPtr) -> EngineResult<()>;

    /// Copy `bytes` into engine memory at `ptr`.
    fn write_bytes(&mut self, ptr: MemPtr, bytes: &[u8]) -> EngineResult<()>;

    /// Decode the NUL-terminated byte range starting at `ptr`.
    fn read_c_string(&self, ptr: MemPtr) -> EngineResult<String>;

    /// Read a little-endian 32-bit word at `ptr`.
    fn read_i32_le(&self, ptr: MemPtr) -> EngineResult<i32>;

    // ------------------------------------------------------------------------
    // Handle lifecycle
    // ------------------------------------------------------------------------

    /// Reserve a new number handle.
    fn alloc(&mut self) -> EngineResult<RawHandle>;

    /// Clear and release a handle.
    fn free(&mut self, handle: RawHandle) -> EngineResult<()>;

    /// Initialize `handle` with a working precision. The value becomes NaN.
    fn set_precision(&mut self, handle: RawHandle, bits: u32) -> EngineResult<()>;

    /// Working precision of `handle`.
    fn precision(&self, handle: RawHandle) -> EngineResult<u32>;

    // ------------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------------

    fn set_from_int(&mut self, handle: RawHandle, value: i64, rnd: RoundingMode)
        -> EngineResult<()>;

    fn set_from_double(
        &mut self,
        handle: RawHandle,
        value: f64,
        rnd: RoundingMode,
    ) -> EngineResult<()>;

    /// Parse the NUL-terminated string at `src`. Returns 0 when the whole
    /// string is a valid number in `radix`, non-zero otherwise.
    fn set_from_string(
        &mut self,
        handle: RawHandle,
        src: MemPtr,
        radix: u32,
        rnd: RoundingMode,
    ) -> EngineResult<i32>;

    fn copy(&mut self, dst: RawHandle, src: RawHandle, rnd: RoundingMode) -> EngineResult<()>;

    fn negate(&mut self, dst: RawHandle, src: RawHandle, rnd: RoundingMode) -> EngineResult<()>;

    // ------------------------------------------------------------------------
    // Arithmetic
    // ------------------------------------------------------------------------

    fn add(&mut self, dst: RawHandle, a: RawHandle, b: RawHandle, rnd: RoundingMode)
        -> EngineResult<()>;

    fn add_double(&mut self, dst: RawHandle, a: RawHandle, b: f64, rnd: RoundingMode)
        -> EngineResult<()>;

    fn sub(&mut self, dst: RawHandle, a: RawHandle, b: RawHandle, rnd: RoundingMode)
        -> EngineResult<()>;

    fn sub_double(&mut self, dst: RawHandle, a: RawHandle, b: f64, rnd: RoundingMode)
        -> EngineResult<()>;

    fn mul(&mut self, dst: RawHandle, a: RawHandle, b: RawHandle, rnd: RoundingMode)
        -> EngineResult<()>;

    fn mul_int(&mut self, dst: RawHandle, a: RawHandle, b: i64, rnd: RoundingMode)
        -> EngineResult<()>;

    fn mul_double(&mut self, dst: RawHandle, a: RawHandle, b: f64, rnd: RoundingMode)
        -> EngineResult<()>;

    fn div(&mut self, dst: RawHandle, a: RawHandle, b: RawHandle, rnd: RoundingMode)
        -> EngineResult<()>;

    fn div_double(&mut self, dst: RawHandle, a: RawHandle, b: f64, rnd: RoundingMode)
        -> EngineResult<()>;

    // ------------------------------------------------------------------------
    // Formatting
    // ------------------------------------------------------------------------

    /// Digits needed in `radix` so that a `precision_bits` value survives a
    /// render/parse round trip.
    fn digit_count(&self, radix: u32, precision_bits: u32) -> EngineResult<usize>;

    /// Render `handle` as `digits` significant digits in `radix`.
    ///
    /// Writes into `dest` when it is non-null (the caller guarantees room
    /// for `max(7, digits + 2)` bytes), otherwise allocates and returns a
    /// string the caller must release with
    /// [`NumericEngine::free_formatted`]. The exponent word at `exp_out`
    /// receives `E` such that the value is `0.DIGITS × radix^E`.
    fn format(
        &mut self,
        dest: MemPtr,
        exp_out: MemPtr,
        radix: u32,
        digits: usize,
        handle: RawHandle,
        rnd: RoundingMode,
    ) -> EngineResult<MemPtr>;

    /// Release a string the engine allocated in [`NumericEngine::format`].
    fn free_formatted(&mut self, ptr: MemPtr) -> EngineResult<()>;
}
