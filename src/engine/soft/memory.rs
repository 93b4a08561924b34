// ============================================================================
// Linear Memory
// Byte-addressed engine memory with a first-fit allocator
// ============================================================================

use crate::interfaces::{EngineFault, EngineResult, MemPtr};
use std::collections::BTreeMap;

/// Allocation granularity and alignment
const ALIGN: u32 = 8;

/// Bytes reserved at offset 0 so no allocation is ever NULL
const RESERVED: usize = ALIGN as usize;

/// Default upper bound on memory size (64 MiB)
pub const DEFAULT_MEMORY_LIMIT: usize = 64 * 1024 * 1024;

/// Simulated linear memory.
///
/// Freed blocks are merged with free neighbours and reused first-fit. A free
/// block at the top of memory is handed back, so the memory only grows when
/// no free block is large enough.
#[derive(Debug)]
pub struct LinearMemory {
    bytes: Vec<u8>,
    /// Live allocations: offset -> block size
    live: BTreeMap<u32, u32>,
    /// Released ranges available for reuse: offset -> size. Never adjacent.
    free_blocks: BTreeMap<u32, u32>,
    limit: usize,
}

impl LinearMemory {
    pub fn new(limit: usize) -> Self {
        Self {
            bytes: vec![0; RESERVED],
            live: BTreeMap::new(),
            free_blocks: BTreeMap::new(),
            limit,
        }
    }

    /// Current memory size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Number of live allocations
    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }

    pub fn malloc(&mut self, size: usize) -> EngineResult<MemPtr> {
        let block = Self::block_size(size)?;

        let fit = self
            .free_blocks
            .iter()
            .find(|&(_, &len)| len >= block)
            .map(|(&offset, &len)| (offset, len));
        if let Some((offset, len)) = fit {
            self.free_blocks.remove(&offset);
            if len > block {
                self.free_blocks.insert(offset + block, len - block);
            }
            self.live.insert(offset, block);
            self.bytes[offset as usize..(offset + block) as usize].fill(0);
            return Ok(MemPtr::new(offset));
        }

        let offset = self.bytes.len();
        let end = offset + block as usize;
        if end > self.limit {
            return Err(EngineFault::new(format!(
                "out of memory: {} bytes requested, limit {} bytes",
                size, self.limit
            )));
        }
        let offset = u32::try_from(offset)
            .map_err(|_| EngineFault::new("linear memory exceeds 32-bit address space"))?;

        self.bytes.resize(end, 0);
        self.live.insert(offset, block);
        Ok(MemPtr::new(offset))
    }

    pub fn free(&mut self, ptr: MemPtr) -> EngineResult<()> {
        let block = self
            .live
            .remove(&ptr.offset())
            .ok_or_else(|| EngineFault::new(format!("free of unallocated pointer {}", ptr)))?;
        self.release_range(ptr.offset(), block);
        Ok(())
    }

    /// Size of the live block starting at `ptr`.
    pub fn block_len(&self, ptr: MemPtr) -> Option<usize> {
        self.live.get(&ptr.offset()).map(|&len| len as usize)
    }

    pub fn write(&mut self, ptr: MemPtr, data: &[u8]) -> EngineResult<()> {
        let range = self.range(ptr, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    /// Write `text` followed by a NUL terminator.
    pub fn write_c_string(&mut self, ptr: MemPtr, text: &str) -> EngineResult<()> {
        self.write(ptr, text.as_bytes())?;
        let end = ptr
            .checked_add(text.len())
            .ok_or_else(|| EngineFault::new("string end out of bounds"))?;
        self.write(end, &[0])
    }

    pub fn read_c_string(&self, ptr: MemPtr) -> EngineResult<String> {
        let start = self.range(ptr, 0)?.start;
        let len = self.bytes[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| EngineFault::new(format!("unterminated string at {}", ptr)))?;
        Ok(String::from_utf8_lossy(&self.bytes[start..start + len]).into_owned())
    }

    pub fn read_i32_le(&self, ptr: MemPtr) -> EngineResult<i32> {
        let range = self.range(ptr, 4)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.bytes[range]);
        Ok(i32::from_le_bytes(word))
    }

    pub fn write_i32_le(&mut self, ptr: MemPtr, value: i32) -> EngineResult<()> {
        self.write(ptr, &value.to_le_bytes())
    }

    // ========================================================================
    // Private methods
    // ========================================================================

    /// Return `[offset, offset + len)` to the free list, merging it with the
    /// free ranges on either side.
    fn release_range(&mut self, mut offset: u32, mut len: u32) {
        let previous = self
            .free_blocks
            .range(..offset)
            .next_back()
            .map(|(&start, &size)| (start, size));
        if let Some((start, size)) = previous {
            if start + size == offset {
                self.free_blocks.remove(&start);
                offset = start;
                len += size;
            }
        }
        if let Some(size) = self.free_blocks.remove(&(offset + len)) {
            len += size;
        }

        if (offset + len) as usize == self.bytes.len() {
            self.bytes.truncate(offset as usize);
        } else {
            self.free_blocks.insert(offset, len);
        }
    }

    fn block_size(size: usize) -> EngineResult<u32> {
        let size = u32::try_from(size.max(1))
            .map_err(|_| EngineFault::new(format!("allocation of {} bytes too large", size)))?;
        size.checked_add(ALIGN - 1)
            .map(|s| s & !(ALIGN - 1))
            .ok_or_else(|| EngineFault::new("allocation size overflow"))
    }

    fn range(&self, ptr: MemPtr, len: usize) -> EngineResult<std::ops::Range<usize>> {
        if ptr.is_null() {
            return Err(EngineFault::new("null pointer dereference"));
        }
        let start = ptr.offset() as usize;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| {
                EngineFault::new(format!("access of {} bytes at {} out of bounds", len, ptr))
            })?;
        Ok(start..end)
    }
}
