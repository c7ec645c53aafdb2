/*!
finalize.rs - Centralized end-of-cycle EIP accounting & unknown opcode handling.

Overview
========
This module consolidates:
  1. The trailing EIP increment (`finish`) applied uniformly after every
     handler and after the unknown-opcode branch.
  2. The unknown / unimplemented opcode report (`report_unimplemented`).

EIP Accounting
==============
Handlers leave EIP on the last byte they consumed (see `addressing`). The
trailing increment moves it onto the first byte of the next instruction.
A cycle that halts the CPU skips the increment so EIP keeps pointing at the
HLT byte.

Unknown Opcodes
===============
An opcode byte with no table entry (0x0F included) is non-fatal: the
diagnostic sink receives a warning naming the byte and EIP, and nothing else
changes. EIP then advances by one like any other cycle, so execution resumes
at the following byte.

Non-Responsibilities
====================
- Does NOT decode prefixes or operands.
- Does NOT touch memory.
*/

use crate::cpu::opcode::Opcode;
use crate::cpu::regs::CpuRegs;
use crate::diag::DiagContext;

/// Trailing EIP increment (skipped when this cycle halted the CPU).
pub(crate) fn finish<C: CpuRegs + ?Sized>(cpu: &mut C) {
    if !cpu.halted() {
        cpu.advance_ip(1);
    }
}

pub(crate) fn report_unimplemented<C: CpuRegs + ?Sized>(
    cpu: &C,
    diag: &DiagContext,
    opcode: &Opcode,
) {
    diag.unimplemented_opcode(opcode.instruction, cpu.eip());
}
