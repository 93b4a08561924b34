// ============================================================================
// Soft Engine
// In-process implementation of the numeric engine contract
// ============================================================================
//
// Numbers live in a handle slab, strings in a simulated linear memory. The
// engine checks every handle and pointer it is given and reports misuse as
// a fault instead of corrupting state.

pub mod format;
pub mod memory;
pub mod number;
pub mod parse;

use self::memory::{LinearMemory, DEFAULT_MEMORY_LIMIT};
use self::number::{Exact, SoftNumber, Value};
use crate::domain::{RoundingMode, MAX_PRECISION_BITS, MAX_RADIX, MIN_RADIX};
use crate::interfaces::{EngineFault, EngineResult, MemPtr, NumericEngine, RawHandle};
use std::collections::HashSet;

/// Slab slot state
#[derive(Debug)]
enum Slot {
    Vacant,
    /// Allocated, precision not yet set
    Reserved,
    Live(SoftNumber),
}

/// In-process arbitrary-precision engine.
#[derive(Debug)]
pub struct SoftEngine {
    memory: LinearMemory,
    slots: Vec<Slot>,
    vacant: Vec<u32>,
    /// Strings allocated by `format` and not yet released
    formatted: HashSet<u32>,
}

impl Default for SoftEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftEngine {
    pub fn new() -> Self {
        Self::with_memory_limit(DEFAULT_MEMORY_LIMIT)
    }

    /// Engine whose linear memory never grows beyond `limit` bytes.
    pub fn with_memory_limit(limit: usize) -> Self {
        Self {
            memory: LinearMemory::new(limit),
            slots: Vec::new(),
            vacant: Vec::new(),
            formatted: HashSet::new(),
        }
    }

    /// Number of allocated handles
    pub fn live_handles(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    pub fn memory(&self) -> &LinearMemory {
        &self.memory
    }

    // ========================================================================
    // Private methods
    // ========================================================================

    fn slot_mut(&mut self, handle: RawHandle) -> EngineResult<&mut Slot> {
        let index = (handle.get() as usize).wrapping_sub(1);
        match self.slots.get_mut(index) {
            Some(slot) if !matches!(slot, Slot::Vacant) => Ok(slot),
            _ => Err(EngineFault::new(format!("handle {} is not allocated", handle))),
        }
    }

    fn number(&self, handle: RawHandle) -> EngineResult<&SoftNumber> {
        let index = (handle.get() as usize).wrapping_sub(1);
        match self.slots.get(index) {
            Some(Slot::Live(number)) => Ok(number),
            Some(Slot::Reserved) => Err(EngineFault::new(format!(
                "handle {} has no precision set",
                handle
            ))),
            _ => Err(EngineFault::new(format!("handle {} is not allocated", handle))),
        }
    }

    fn number_mut(&mut self, handle: RawHandle) -> EngineResult<&mut SoftNumber> {
        match self.slot_mut(handle)? {
            Slot::Live(number) => Ok(number),
            _ => Err(EngineFault::new(format!(
                "handle {} has no precision set",
                handle
            ))),
        }
    }

    fn value(&self, handle: RawHandle) -> EngineResult<Value> {
        Ok(self.number(handle)?.value().clone())
    }

    fn store(&mut self, dst: RawHandle, exact: Exact, rnd: RoundingMode) -> EngineResult<()> {
        self.number_mut(dst)?.assign(exact, rnd);
        Ok(())
    }

    fn binary(
        &mut self,
        dst: RawHandle,
        a: RawHandle,
        b: Value,
        rnd: RoundingMode,
        op: impl FnOnce(&Value, &Value, u32) -> Exact,
    ) -> EngineResult<()> {
        let a = self.value(a)?;
        let precision = self.number(dst)?.precision();
        self.store(dst, op(&a, &b, precision), rnd)
    }

    fn check_radix(radix: u32) -> EngineResult<()> {
        if (MIN_RADIX..=MAX_RADIX).contains(&radix) {
            Ok(())
        } else {
            Err(EngineFault::new(format!("unsupported radix {}", radix)))
        }
    }
}

impl NumericEngine for SoftEngine {
    fn name(&self) -> &str {
        "soft"
    }

    fn malloc(&mut self, size: usize) -> EngineResult<MemPtr> {
        self.memory.malloc(size)
    }

    fn dealloc(&mut self, ptr: MemPtr) -> EngineResult<()> {
        if self.formatted.contains(&ptr.offset()) {
            return Err(EngineFault::new(format!(
                "formatted string {} must be released with free_formatted",
                ptr
            )));
        }
        self.memory.free(ptr)
    }

    fn write_bytes(&mut self, ptr: MemPtr, bytes: &[u8]) -> EngineResult<()> {
        self.memory.write(ptr, bytes)
    }

    fn read_c_string(&self, ptr: MemPtr) -> EngineResult<String> {
        self.memory.read_c_string(ptr)
    }

    fn read_i32_le(&self, ptr: MemPtr) -> EngineResult<i32> {
        self.memory.read_i32_le(ptr)
    }

    fn alloc(&mut self) -> EngineResult<RawHandle> {
        let index = match self.vacant.pop() {
            Some(index) => {
                self.slots[index as usize] = Slot::Reserved;
                index
            },
            None => {
                let index = u32::try_from(self.slots.len())
                    .ok()
                    .filter(|&i| i < u32::MAX)
                    .ok_or_else(|| EngineFault::new("handle space exhausted"))?;
                self.slots.push(Slot::Reserved);
                index
            },
        };
        Ok(RawHandle::new(index + 1))
    }

    fn free(&mut self, handle: RawHandle) -> EngineResult<()> {
        let slot = self.slot_mut(handle)?;
        *slot = Slot::Vacant;
        self.vacant.push(handle.get() - 1);
        Ok(())
    }

    fn set_precision(&mut self, handle: RawHandle, bits: u32) -> EngineResult<()> {
        if bits == 0 || bits > MAX_PRECISION_BITS {
            return Err(EngineFault::new(format!("unsupported precision {} bits", bits)));
        }
        let slot = self.slot_mut(handle)?;
        *slot = Slot::Live(SoftNumber::new(bits));
        Ok(())
    }

    fn precision(&self, handle: RawHandle) -> EngineResult<u32> {
        Ok(self.number(handle)?.precision())
    }

    fn set_from_int(&mut self, handle: RawHandle, value: i64, rnd: RoundingMode)
        -> EngineResult<()> {
        self.store(handle, Exact::from_value(Value::from_i64(value)), rnd)
    }

    fn set_from_double(
        &mut self,
        handle: RawHandle,
        value: f64,
        rnd: RoundingMode,
    ) -> EngineResult<()> {
        self.store(handle, Exact::from_value(Value::from_f64(value)), rnd)
    }

    fn set_from_string(
        &mut self,
        handle: RawHandle,
        src: MemPtr,
        radix: u32,
        rnd: RoundingMode,
    ) -> EngineResult<i32> {
        Self::check_radix(radix)?;
        self.number(handle)?;
        let text = self.memory.read_c_string(src)?;

        match parse::parse_literal(&text, radix) {
            Some(exact) => {
                self.store(handle, exact, rnd)?;
                Ok(0)
            },
            None => Ok(-1),
        }
    }

    fn copy(&mut self, dst: RawHandle, src: RawHandle, rnd: RoundingMode) -> EngineResult<()> {
        let value = self.value(src)?;
        self.store(dst, Exact::from_value(value), rnd)
    }

    fn negate(&mut self, dst: RawHandle, src: RawHandle, rnd: RoundingMode) -> EngineResult<()> {
        let value = self.value(src)?.negated();
        self.store(dst, Exact::from_value(value), rnd)
    }

    fn add(&mut self, dst: RawHandle, a: RawHandle, b: RawHandle, rnd: RoundingMode)
        -> EngineResult<()> {
        let b = self.value(b)?;
        self.binary(dst, a, b, rnd, |x, y, p| number::add(x, y, p, rnd))
    }

    fn add_double(&mut self, dst: RawHandle, a: RawHandle, b: f64, rnd: RoundingMode)
        -> EngineResult<()> {
        self.binary(dst, a, Value::from_f64(b), rnd, |x, y, p| number::add(x, y, p, rnd))
    }

    fn sub(&mut self, dst: RawHandle, a: RawHandle, b: RawHandle, rnd: RoundingMode)
        -> EngineResult<()> {
        let b = self.value(b)?;
        self.binary(dst, a, b, rnd, |x, y, p| number::sub(x, y, p, rnd))
    }

    fn sub_double(&mut self, dst: RawHandle, a: RawHandle, b: f64, rnd: RoundingMode)
        -> EngineResult<()> {
        self.binary(dst, a, Value::from_f64(b), rnd, |x, y, p| number::sub(x, y, p, rnd))
    }

    fn mul(&mut self, dst: RawHandle, a: RawHandle, b: RawHandle, rnd: RoundingMode)
        -> EngineResult<()> {
        let b = self.value(b)?;
        self.binary(dst, a, b, rnd, |x, y, _| number::mul(x, y))
    }

    fn mul_int(&mut self, dst: RawHandle, a: RawHandle, b: i64, rnd: RoundingMode)
        -> EngineResult<()> {
        self.binary(dst, a, Value::from_i64(b), rnd, |x, y, _| number::mul(x, y))
    }

    fn mul_double(&mut self, dst: RawHandle, a: RawHandle, b: f64, rnd: RoundingMode)
        -> EngineResult<()> {
        self.binary(dst, a, Value::from_f64(b), rnd, |x, y, _| number::mul(x, y))
    }

    fn div(&mut self, dst: RawHandle, a: RawHandle, b: RawHandle, rnd: RoundingMode)
        -> EngineResult<()> {
        let b = self.value(b)?;
        self.binary(dst, a, b, rnd, |x, y, _| number::div(x, y))
    }

    fn div_double(&mut self, dst: RawHandle, a: RawHandle, b: f64, rnd: RoundingMode)
        -> EngineResult<()> {
        self.binary(dst, a, Value::from_f64(b), rnd, |x, y, _| number::div(x, y))
    }

    fn digit_count(&self, radix: u32, precision_bits: u32) -> EngineResult<usize> {
        Self::check_radix(radix)?;
        if precision_bits == 0 {
            return Err(EngineFault::new("digit count of a zero-bit precision"));
        }
        Ok(format::digit_count(radix, precision_bits))
    }

    fn format(
        &mut self,
        dest: MemPtr,
        exp_out: MemPtr,
        radix: u32,
        digits: usize,
        handle: RawHandle,
        rnd: RoundingMode,
    ) -> EngineResult<MemPtr> {
        Self::check_radix(radix)?;
        let number = self.number(handle)?;
        let n = if digits == 0 {
            format::digit_count(radix, number.precision())
        } else {
            digits
        };

        let (bytes, point) = format::to_digits(number.value(), radix, n, rnd);
        let point = i32::try_from(point)
            .map_err(|_| EngineFault::new(format!("exponent {} does not fit the output word", point)))?;
        let needed = bytes.len() + 1;

        let target = if dest.is_null() {
            let ptr = self.memory.malloc(needed)?;
            self.formatted.insert(ptr.offset());
            ptr
        } else {
            match self.memory.block_len(dest) {
                Some(len) if len >= needed => dest,
                _ => {
                    return Err(EngineFault::new(format!(
                        "format buffer {} cannot hold {} bytes",
                        dest, needed
                    )))
                },
            }
        };

        self.memory.write(target, &bytes)?;
        let end = target
            .checked_add(bytes.len())
            .ok_or_else(|| EngineFault::new("formatted string out of bounds"))?;
        self.memory.write(end, &[0])?;
        self.memory.write_i32_le(exp_out, point)?;
        Ok(target)
    }

    fn free_formatted(&mut self, ptr: MemPtr) -> EngineResult<()> {
        if !self.formatted.remove(&ptr.offset()) {
            return Err(EngineFault::new(format!(
                "{} is not a formatted string",
                ptr
            )));
        }
        self.memory.free(ptr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RND: RoundingMode = RoundingMode::NearestTiesEven;

    fn number(engine: &mut SoftEngine, bits: u32) -> RawHandle {
        let handle = engine.alloc().unwrap();
        engine.set_precision(handle, bits).unwrap();
        handle
    }

    fn render(engine: &mut SoftEngine, handle: RawHandle, digits: usize) -> (String, i32) {
        let exp = engine.malloc(4).unwrap();
        let ptr = engine
            .format(MemPtr::NULL, exp, 10, digits, handle, RND)
            .unwrap();
        let text = engine.read_c_string(ptr).unwrap();
        let point = engine.read_i32_le(exp).unwrap();
        engine.free_formatted(ptr).unwrap();
        engine.dealloc(exp).unwrap();
        (text, point)
    }

    #[test]
    fn test_handle_lifecycle() {
        let mut engine = SoftEngine::new();
        let a = engine.alloc().unwrap();
        let b = engine.alloc().unwrap();
        assert_ne!(a, b);
        assert_eq!(engine.live_handles(), 2);

        engine.free(a).unwrap();
        assert_eq!(engine.live_handles(), 1);
        assert!(engine.free(a).is_err());
        assert!(engine.precision(a).is_err());

        // Vacated slots are reused
        let c = engine.alloc().unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn test_unknown_handles_fault() {
        let mut engine = SoftEngine::new();
        assert!(engine.free(RawHandle::new(0)).is_err());
        assert!(engine.free(RawHandle::new(9)).is_err());
        assert!(engine
            .set_from_int(RawHandle::new(1), 1, RND)
            .is_err());
    }

    #[test]
    fn test_reserved_handle_needs_precision() {
        let mut engine = SoftEngine::new();
        let handle = engine.alloc().unwrap();
        assert!(engine.set_from_int(handle, 3, RND).is_err());
        engine.set_precision(handle, 53).unwrap();
        assert_eq!(engine.precision(handle).unwrap(), 53);
        assert!(engine.set_precision(handle, 0).is_err());
    }

    #[test]
    fn test_arithmetic() {
        let mut engine = SoftEngine::new();
        let a = number(&mut engine, 53);
        let b = number(&mut engine, 53);
        let dst = number(&mut engine, 53);

        engine.set_from_int(a, 7, RND).unwrap();
        engine.set_from_double(b, 0.5, RND).unwrap();

        engine.add(dst, a, b, RND).unwrap();
        assert_eq!(render(&mut engine, dst, 3), ("750".to_string(), 1));

        engine.mul_int(dst, a, 3, RND).unwrap();
        assert_eq!(render(&mut engine, dst, 2), ("21".to_string(), 2));

        engine.div_double(dst, a, 2.0, RND).unwrap();
        assert_eq!(render(&mut engine, dst, 2), ("35".to_string(), 1));

        engine.sub(dst, b, a, RND).unwrap();
        assert_eq!(render(&mut engine, dst, 2), ("-65".to_string(), 1));

        engine.negate(dst, dst, RND).unwrap();
        assert_eq!(render(&mut engine, dst, 2), ("65".to_string(), 1));
    }

    #[test]
    fn test_set_from_string() {
        let mut engine = SoftEngine::new();
        let handle = number(&mut engine, 53);
        let src = engine.malloc(16).unwrap();

        engine.write_bytes(src, b"-12.25\0").unwrap();
        assert_eq!(engine.set_from_string(handle, src, 10, RND).unwrap(), 0);
        assert_eq!(render(&mut engine, handle, 4), ("-1225".to_string(), 2));

        // Failed parse leaves the value unchanged
        engine.write_bytes(src, b"12x\0").unwrap();
        assert_eq!(engine.set_from_string(handle, src, 10, RND).unwrap(), -1);
        assert_eq!(render(&mut engine, handle, 4), ("-1225".to_string(), 2));

        assert!(engine.set_from_string(handle, src, 37, RND).is_err());
    }

    #[test]
    fn test_format_default_digit_count() {
        let mut engine = SoftEngine::new();
        let handle = number(&mut engine, 53);
        engine.set_from_int(handle, 1, RND).unwrap();
        let (text, point) = render(&mut engine, handle, 0);
        assert_eq!(text.len(), 17);
        assert_eq!(point, 1);
    }

    #[test]
    fn test_format_into_caller_buffer() {
        let mut engine = SoftEngine::new();
        let handle = number(&mut engine, 53);
        engine.set_from_double(handle, 0.375, RND).unwrap();

        let buffer = engine.malloc(8).unwrap();
        let exp = engine.malloc(4).unwrap();
        let ptr = engine.format(buffer, exp, 10, 3, handle, RND).unwrap();
        assert_eq!(ptr, buffer);
        assert_eq!(engine.read_c_string(ptr).unwrap(), "375");
        assert_eq!(engine.read_i32_le(exp).unwrap(), 0);

        // Not engine-allocated: must not be released as a formatted string
        assert!(engine.free_formatted(ptr).is_err());

        // Too small for 17 digits
        assert!(engine.format(buffer, exp, 10, 17, handle, RND).is_err());
    }

    #[test]
    fn test_formatted_strings_need_matching_release() {
        let mut engine = SoftEngine::new();
        let handle = number(&mut engine, 53);
        engine.set_from_int(handle, 5, RND).unwrap();

        let exp = engine.malloc(4).unwrap();
        let ptr = engine.format(MemPtr::NULL, exp, 10, 2, handle, RND).unwrap();
        assert!(engine.dealloc(ptr).is_err());
        engine.free_formatted(ptr).unwrap();
        assert!(engine.free_formatted(ptr).is_err());
    }

    #[test]
    fn test_memory_limit_faults() {
        let mut engine = SoftEngine::with_memory_limit(64);
        assert!(engine.malloc(1024).is_err());
    }
}
