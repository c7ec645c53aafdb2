/*!
cpu::mod - Public façade for the x86 CPU core.

The core is split into small modules:

```text
state.rs        - Register file (with sub-width aliasing), EFLAGS store,
                  and the copyable `CpuState` that combines them.
regs.rs         - `CpuRegs` trait: the register/flag API used by helpers.
opcode.rs       - Per-cycle decode record (prefixes, opcode, ModR/M, SIB).
addressing.rs   - Instruction fetch, ModR/M + SIB operand resolution.
execute.rs      - Instruction semantic helpers (ALU, flags, stack).
table.rs        - Static opcode -> handler table.
dispatch/       - One cycle: prefix scan, table lookup, finalization,
                  plus the opcode family handlers.
core/           - `Cpu` façade owning state, memory and configuration.
```

The public surface is exposed via the `Cpu` facade. Downstream code should
not rely on internal module layout.

Usage:
```rust
use x86emu::{Cpu, CpuConfig, Register};

let mut cpu = Cpu::new(CpuConfig::default());
cpu.load_image(&[0x04, 0x05, 0xF4]).unwrap(); // ADD AL, 5 ; HLT
cpu.run(16).unwrap();
assert_eq!(cpu.reg(Register::Al), 5);
assert!(cpu.is_halted());
```
*/

pub mod addressing;
pub mod core;
pub mod dispatch;
pub mod execute;
pub mod opcode;
pub mod regs;
pub mod state;
pub mod table;

// Re-exports:
// - Cpu (facade over CpuState + Memory)
// - CpuState (raw state; exposed for tests, snapshots, trait impls)
pub use crate::cpu::core::Cpu;
pub use crate::cpu::regs::CpuRegs;
pub use crate::cpu::state::{CpuState, Flag, FlagStore, Register, RegisterFile};
