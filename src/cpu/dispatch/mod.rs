/*!
dispatch - Orchestrator for a single x86 CPU cycle (prefix scan / execute)

Overview
========
Coordinates one instruction:
1. PrefixScan: collect legacy prefixes (0x2E 0x36 0x3E 0x26 0x64 0x65 0x66
   0x67) until the first non-prefix byte, which is the opcode.
2. Execute: look the opcode up in the static table (`cpu::table`). A hit runs
   the handler, which consumes every remaining byte of the instruction. A
   miss is reported through the diagnostic sink and otherwise ignored.
3. Finalize: one trailing EIP increment (see `finalize`).

Atomicity
=========
The register/flag state is `Copy`; it is snapshotted before the cycle and
restored if any memory access fails. Handlers perform at most one memory
write, and always as their last fallible step, so memory is never left
half-updated.

Operand Forms
=============
The two-operand ALU instructions share one driver, `binary_op`, keyed by
`Form` (where destination and source come from) and `Width` (fixed 8-bit
or the configured 16/32-bit width).
*/

/// Table handler for a two-operand ALU instruction form.
macro_rules! alu_handler {
    ($name:ident, $op:expr, $form:expr, $width:expr) => {
        pub(crate) fn $name(
            cpu: &mut dyn $crate::cpu::regs::CpuRegs,
            mem: &mut $crate::memory::Memory,
            opcode: &mut $crate::cpu::opcode::Opcode,
            config: &$crate::config::CpuConfig,
        ) -> Result<(), $crate::error::MemoryError> {
            $crate::cpu::dispatch::binary_op(cpu, mem, opcode, config, $form, $width, $op)
        }
    };
}

pub(crate) mod arithmetic;
pub(crate) mod finalize;
pub(crate) mod logical;
pub(crate) mod misc;

use crate::config::{AddressSize, CpuConfig, OperandSize};
use crate::cpu::addressing::{
    Side, fetch_imm, fetch_modrm, read_operand, resolve_operand, write_operand,
};
use crate::cpu::execute::AluOp;
use crate::cpu::opcode::{Opcode, Prefix};
use crate::cpu::regs::CpuRegs;
use crate::cpu::state::{CpuState, Register};
use crate::cpu::table;
use crate::diag::DiagContext;
use crate::error::MemoryError;
use crate::memory::Memory;

/// What a call to `cycle` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Executed,
    /// The opcode byte has no handler; only EIP moved.
    Unimplemented,
    /// The CPU was already halted; nothing happened.
    Idle,
}

/// Execute one instruction, rolling registers and flags back on error.
pub(crate) fn cycle(
    state: &mut CpuState,
    mem: &mut Memory,
    config: &CpuConfig,
    diag: &DiagContext,
) -> Result<Step, MemoryError> {
    if state.halted {
        return Ok(Step::Idle);
    }
    let snapshot = *state;
    execute(state, mem, config, diag).inspect_err(|_| *state = snapshot)
}

fn execute(
    state: &mut CpuState,
    mem: &mut Memory,
    config: &CpuConfig,
    diag: &DiagContext,
) -> Result<Step, MemoryError> {
    let mut opcode = scan_prefixes(state, mem)?;

    let step = match table::lookup(opcode.instruction) {
        Some(handler) => {
            handler(state, mem, &mut opcode, config)?;
            tracing::trace!(%opcode, "executed");
            Step::Executed
        }
        None => {
            finalize::report_unimplemented(&*state, diag, &opcode);
            Step::Unimplemented
        }
    };

    finalize::finish(state);
    Ok(step)
}

/// PrefixScan: leave EIP on the opcode byte and return the partially filled
/// decode record.
fn scan_prefixes<C: CpuRegs + ?Sized>(cpu: &mut C, mem: &Memory) -> Result<Opcode, MemoryError> {
    let mut opcode = Opcode::new(cpu.eip());
    loop {
        let byte = mem.read_u8(cpu.eip())?;
        match Prefix::from_byte(byte) {
            Some(prefix) => {
                opcode.prefixes.push(prefix);
                cpu.advance_ip(1);
            }
            None => {
                opcode.instruction = byte;
                return Ok(opcode);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Shared operand forms
// ---------------------------------------------------------------------------

/// Where the destination and source of a two-operand instruction live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Form {
    /// `op r/m, reg` (destination may be memory).
    RmReg,
    /// `op reg, r/m`.
    RegRm,
    /// `op AL/eAX, imm` (no ModR/M).
    AccImm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Width {
    Byte,
    /// 16 or 32 bits, from the configured default and the 0x66 prefix.
    Full,
}

pub(crate) fn operand_size(opcode: &Opcode, config: &CpuConfig, width: Width) -> OperandSize {
    match width {
        Width::Byte => OperandSize::Byte,
        Width::Full => config.operand_size(opcode.has_prefix(Prefix::OperandSize)),
    }
}

pub(crate) fn address_size(opcode: &Opcode, config: &CpuConfig) -> AddressSize {
    config.address_size(opcode.has_prefix(Prefix::AddressSize))
}

/// Fetch operands, apply `op`, write the result back to the destination.
pub(crate) fn binary_op<C: CpuRegs + ?Sized>(
    cpu: &mut C,
    mem: &mut Memory,
    opcode: &mut Opcode,
    config: &CpuConfig,
    form: Form,
    width: Width,
    op: AluOp,
) -> Result<(), MemoryError> {
    let size = operand_size(opcode, config, width);

    if form == Form::AccImm {
        let acc = Register::from_encoding(0, size);
        let imm = fetch_imm(cpu, mem, size)?;
        let a = cpu.reg(acc);
        let r = op.apply(cpu, a, imm, size);
        cpu.set_reg(acc, r);
        return Ok(());
    }

    let mode = address_size(opcode, config);
    fetch_modrm(cpu, mem, opcode)?;
    let rm = resolve_operand(cpu, mem, opcode, mode, Side::Rm, size)?;
    let reg = resolve_operand(cpu, mem, opcode, mode, Side::Reg, size)?;
    let (dst, src) = match form {
        Form::RmReg => (rm, reg),
        _ => (reg, rm),
    };

    let a = read_operand(&*cpu, mem, dst, size)?;
    let b = read_operand(&*cpu, mem, src, size)?;
    let r = op.apply(cpu, a, b, size);
    write_operand(cpu, mem, dst, size, r)
}
