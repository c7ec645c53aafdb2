/*!
regs.rs - CpuRegs trait providing a minimal, generic register + flag
manipulation interface for x86 execution / dispatch.

Scope
=====
The trait does NOT include:
  - Memory access of any kind
  - Instruction fetch helpers (these live in `addressing.rs`)
  - Configuration / prefix interpretation

Memory, fetch, and stack operations remain explicit at call sites via
`&mut Memory` to avoid over-borrowing and to keep trait implementations
simple.

Implementations Provided
========================
- CpuRegs for `CpuState` (the canonical state owner)

Design Goals
============
1. Small surface area: only what instruction helpers require.
2. Object safe, so the dispatch table can hold plain `fn` pointers taking
   `&mut dyn CpuRegs`.
3. Default methods for composites (`advance_ip`, `update_szp`, ...) reduce
   duplication across implementors.
*/

use crate::config::OperandSize;
use crate::cpu::execute::parity;
use crate::cpu::state::{CpuState, Flag, Register};

/// Trait exposing the x86 architectural register + flag API needed by
/// instruction semantic and dispatch code.
pub trait CpuRegs {
    // ---------------------------------------------------------------------
    // Registers
    // ---------------------------------------------------------------------
    fn reg(&self, reg: Register) -> u32;
    fn set_reg(&mut self, reg: Register, value: u32);

    /// Add `delta` to `reg` (wrapping at the view width); return the new value.
    #[inline]
    fn increment(&mut self, reg: Register, delta: u32) -> u32 {
        let v = self.reg(reg).wrapping_add(delta);
        self.set_reg(reg, v);
        self.reg(reg)
    }

    /// Subtract `delta` from `reg` (wrapping at the view width); return the
    /// new value.
    #[inline]
    fn decrement(&mut self, reg: Register, delta: u32) -> u32 {
        let v = self.reg(reg).wrapping_sub(delta);
        self.set_reg(reg, v);
        self.reg(reg)
    }

    // ---------------------------------------------------------------------
    // Instruction pointer
    // ---------------------------------------------------------------------
    #[inline]
    fn eip(&self) -> u32 {
        self.reg(Register::Eip)
    }

    #[inline]
    fn set_eip(&mut self, value: u32) {
        self.set_reg(Register::Eip, value);
    }

    /// Advance EIP by `delta`; return the new value.
    #[inline]
    fn advance_ip(&mut self, delta: u32) -> u32 {
        self.increment(Register::Eip, delta)
    }

    // ---------------------------------------------------------------------
    // Flags
    // ---------------------------------------------------------------------
    fn flag(&self, flag: Flag) -> bool;
    fn set_flag(&mut self, flag: Flag, on: bool);

    /// Composite: SF, ZF and PF from a result of the given width.
    #[inline]
    fn update_szp(&mut self, result: u32, size: OperandSize) {
        let r = result & size.mask();
        self.set_flag(Flag::Sf, (r >> size.sign_shift()) & 1 != 0);
        self.set_flag(Flag::Zf, r == 0);
        self.set_flag(Flag::Pf, parity(r));
    }

    // ---------------------------------------------------------------------
    // Execution control
    // ---------------------------------------------------------------------
    fn halted(&self) -> bool;
    fn set_halted(&mut self, halted: bool);
}

// -------------------------------------------------------------------------
// Implementation: CpuState (canonical)
// -------------------------------------------------------------------------

impl CpuRegs for CpuState {
    #[inline]
    fn reg(&self, reg: Register) -> u32 {
        self.regs.get(reg)
    }

    #[inline]
    fn set_reg(&mut self, reg: Register, value: u32) {
        self.regs.set(reg, value);
    }

    #[inline]
    fn increment(&mut self, reg: Register, delta: u32) -> u32 {
        self.regs.increment(reg, delta)
    }

    #[inline]
    fn decrement(&mut self, reg: Register, delta: u32) -> u32 {
        self.regs.decrement(reg, delta)
    }

    #[inline]
    fn flag(&self, flag: Flag) -> bool {
        self.flags.get(flag)
    }

    #[inline]
    fn set_flag(&mut self, flag: Flag, on: bool) {
        self.flags.set(flag, on);
    }

    #[inline]
    fn halted(&self) -> bool {
        self.halted
    }

    #[inline]
    fn set_halted(&mut self, halted: bool) {
        self.halted = halted;
    }
}
