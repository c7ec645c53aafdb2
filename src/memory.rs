/*!
Memory module: the flat, byte-addressable store owned by one CPU.

Address map:
- $00000000-(size-1): linear RAM, little-endian for multi-byte access.

There is no segmentation, mirroring, or MMIO. Every access is bounds
checked; touching a byte at or beyond `size()` yields
`MemoryError::AddressOutOfRange` instead of reading or writing anything.
Multi-byte accesses are all-or-nothing.
*/

use crate::error::MemoryError;

/// Default memory size used by `CpuConfig::default()` (just under 1 MiB).
pub const DEFAULT_MEMORY_SIZE: usize = 0xF_FFFF;

/// Linear little-endian byte store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create a zero-filled store of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    /// Clear memory contents to 0.
    #[inline]
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Capacity in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn read_u8(&self, addr: u32) -> Result<u8, MemoryError> {
        let idx = self.index(addr, 1)?;
        Ok(self.data[idx])
    }

    #[inline]
    pub fn read_u16(&self, addr: u32) -> Result<u16, MemoryError> {
        let idx = self.index(addr, 2)?;
        Ok(u16::from_le_bytes([self.data[idx], self.data[idx + 1]]))
    }

    #[inline]
    pub fn read_u32(&self, addr: u32) -> Result<u32, MemoryError> {
        let idx = self.index(addr, 4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.data[idx..idx + 4]);
        Ok(u32::from_le_bytes(buf))
    }

    #[inline]
    pub fn write_u8(&mut self, addr: u32, value: u8) -> Result<(), MemoryError> {
        let idx = self.index(addr, 1)?;
        self.data[idx] = value;
        Ok(())
    }

    #[inline]
    pub fn write_u16(&mut self, addr: u32, value: u16) -> Result<(), MemoryError> {
        let idx = self.index(addr, 2)?;
        self.data[idx..idx + 2].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    #[inline]
    pub fn write_u32(&mut self, addr: u32, value: u32) -> Result<(), MemoryError> {
        let idx = self.index(addr, 4)?;
        self.data[idx..idx + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Copy `bytes` into memory starting at `offset`.
    pub fn load(&mut self, offset: u32, bytes: &[u8]) -> Result<(), MemoryError> {
        let idx = self.index(offset, bytes.len())?;
        self.data[idx..idx + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Expose the backing buffer (read-only). Useful for diagnostics or hashing.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Expose the backing buffer for bulk loading.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Validate that `[addr, addr + width)` lies inside the store and return
    /// the starting index.
    #[inline]
    fn index(&self, addr: u32, width: usize) -> Result<usize, MemoryError> {
        let start = addr as usize;
        match start.checked_add(width) {
            Some(end) if end <= self.data.len() => Ok(start),
            _ => Err(MemoryError::AddressOutOfRange {
                address: addr as u64,
                width,
                size: self.data.len(),
            }),
        }
    }
}
