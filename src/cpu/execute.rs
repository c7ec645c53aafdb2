/*!
execute.rs - x86 instruction semantic helpers (ALU, flags, stack)

Purpose
=======
Centralize the side-effect logic for instructions so every dispatch form
(register/register, register/memory, accumulator/immediate) shares a single
implementation of each operation.

Scope (crate-visible)
---------------------
Flag helpers:
    parity, overflow_heuristic

ALU (generic over CpuRegs, width-aware):
    add, adc, or
    AluOp (selector used by the dispatch forms)

Stack helpers:
    push16, pop16

Design Notes
============
- ALU helpers take already-fetched operand values and return the truncated
  result; they set flags but never touch memory, so the caller can perform
  the single memory write last.
- Stack helpers do touch memory; the push writes after SP is adjusted and
  the dispatcher restores SP if that write fails.
*/

use crate::config::OperandSize;
use crate::cpu::regs::CpuRegs;
use crate::cpu::state::{Flag, Register};
use crate::error::MemoryError;
use crate::memory::Memory;

// ---------------------------------------------------------------------------
// Flag helpers
// ---------------------------------------------------------------------------

/// PF: true when the low byte has an even number of set bits.
#[inline]
pub fn parity(value: u32) -> bool {
    (value as u8).count_ones() % 2 == 0
}

/// Carry / overflow pair reported by the additive instructions.
///
/// Overflow is not derived from the operand signs. Instead a raw carry that
/// coincides with a negative result is reported as overflow with carry
/// cleared; every other case reports the raw carry and no overflow.
///
/// Returns `(cf, of)`.
#[inline]
pub fn overflow_heuristic(cf_raw: bool, sf: bool) -> (bool, bool) {
    if cf_raw && sf {
        (false, true)
    } else {
        (cf_raw, false)
    }
}

// ---------------------------------------------------------------------------
// ALU
// ---------------------------------------------------------------------------

/// ADD: `a + b`, truncated to `size`, with the full arithmetic flag set.
#[inline]
pub(crate) fn add<C: CpuRegs + ?Sized>(cpu: &mut C, a: u32, b: u32, size: OperandSize) -> u32 {
    add_with_carry(cpu, a, b, false, size)
}

/// ADC: `a + b + CF`.
#[inline]
pub(crate) fn adc<C: CpuRegs + ?Sized>(cpu: &mut C, a: u32, b: u32, size: OperandSize) -> u32 {
    let carry_in = cpu.flag(Flag::Cf);
    add_with_carry(cpu, a, b, carry_in, size)
}

fn add_with_carry<C: CpuRegs + ?Sized>(
    cpu: &mut C,
    a: u32,
    b: u32,
    carry_in: bool,
    size: OperandSize,
) -> u32 {
    let mask = size.mask();
    let (a, b, c) = (a & mask, b & mask, carry_in as u32);
    let r = a.wrapping_add(b).wrapping_add(c) & mask;

    cpu.update_szp(r, size);
    let (cf, of) = overflow_heuristic(r < a, cpu.flag(Flag::Sf));
    cpu.set_flag(Flag::Cf, cf);
    cpu.set_flag(Flag::Of, of);
    cpu.set_flag(Flag::Af, (a & 0xF) + (b & 0xF) + c > 15);
    r
}

/// OR: bitwise or; CF and OF cleared, AF untouched.
#[inline]
pub(crate) fn or<C: CpuRegs + ?Sized>(cpu: &mut C, a: u32, b: u32, size: OperandSize) -> u32 {
    let r = (a | b) & size.mask();
    cpu.update_szp(r, size);
    cpu.set_flag(Flag::Cf, false);
    cpu.set_flag(Flag::Of, false);
    r
}

/// Two-operand ALU operation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AluOp {
    Add,
    Adc,
    Or,
}

impl AluOp {
    #[inline]
    pub(crate) fn apply<C: CpuRegs + ?Sized>(
        self,
        cpu: &mut C,
        a: u32,
        b: u32,
        size: OperandSize,
    ) -> u32 {
        match self {
            AluOp::Add => add(cpu, a, b, size),
            AluOp::Adc => adc(cpu, a, b, size),
            AluOp::Or => or(cpu, a, b, size),
        }
    }
}

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

/// SP -= 2, then store `value` at ESP.
pub(crate) fn push16<C: CpuRegs + ?Sized>(
    cpu: &mut C,
    mem: &mut Memory,
    value: u16,
) -> Result<(), MemoryError> {
    cpu.decrement(Register::Sp, 2);
    mem.write_u16(cpu.reg(Register::Esp), value)
}

/// Load the word at ESP, then SP += 2.
pub(crate) fn pop16<C: CpuRegs + ?Sized>(cpu: &mut C, mem: &Memory) -> Result<u16, MemoryError> {
    let v = mem.read_u16(cpu.reg(Register::Esp))?;
    cpu.increment(Register::Sp, 2);
    Ok(v)
}
