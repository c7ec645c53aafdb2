#![doc = r#"
x86emu library crate.

An interpreter for a small subset of the 32-bit x86 instruction set
executing against a flat, bounds-checked memory.

Modules:
- cpu: CPU core (facade + state + addressing + dispatch + execute modules)
- memory: flat little-endian byte store owned by the CPU
- config: CPU capability set (memory size, default operand/address widths)
- error: error types (`MemoryError`, crate `Error` / `Result`)
- diag: diagnostic clock and warning sink (logs through `tracing`)

In tests, shared program builders are available under `crate::test_utils`.
"#]

pub mod config;
pub mod cpu;
pub mod diag;
pub mod error;
pub mod memory;

// Re-export commonly used types at the crate root for convenience.
pub use config::{AddressSize, CpuConfig, OperandSize};
pub use cpu::core::Cpu;
pub use cpu::state::{Flag, Register};
pub use diag::DiagContext;
pub use error::{Error, MemoryError, Result};
pub use memory::Memory;

// Shared test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;
