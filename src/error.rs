/*!
error.rs - Error types for the emulator core.

Only two things can fail inside the core:
- A memory access that touches a byte outside the backing store.
- Loading a program image that does not fit in memory.

Unimplemented opcodes are NOT errors: `cycle()` logs a warning and keeps
going (see `diag`).
*/

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure raised by `Memory` accessors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    #[error("address out of range: address={address:#x} width={width} size={size:#x}")]
    AddressOutOfRange { address: u64, width: usize, size: usize },
}

/// Crate-level error returned by the `Cpu` façade.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("program image of {len} bytes does not fit in {capacity} bytes of memory")]
    ImageTooLarge { len: usize, capacity: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_error_converts_into_crate_error() {
        let e: Error = MemoryError::AddressOutOfRange {
            address: 0x10,
            width: 4,
            size: 0x10,
        }
        .into();
        assert!(matches!(e, Error::Memory(_)));
        assert_eq!(
            e.to_string(),
            "address out of range: address=0x10 width=4 size=0x10"
        );
    }
}
