/*!
misc.rs - Segment stack / HLT opcode family handlers

Overview
========
Stack:
  PUSH ES (0x06), POP ES (0x07), PUSH CS (0x0E),
  PUSH SS (0x16), POP SS (0x17)

Control:
  HLT (0xF4)

Stack Semantics
===============
- PUSH: SP -= 2, then the 16-bit segment value is stored at ESP.
- POP: the word at ESP is loaded, then SP += 2.
The stack pointer is always adjusted through its 16-bit view, so SP wraps
within the low word of ESP.

HLT
===
Sets the halted latch and nothing else. The dispatcher's trailing increment
is skipped on the halting cycle, leaving EIP on the HLT byte.
*/

use crate::config::CpuConfig;
use crate::cpu::execute::{pop16, push16};
use crate::cpu::opcode::Opcode;
use crate::cpu::regs::CpuRegs;
use crate::cpu::state::Register;
use crate::error::MemoryError;
use crate::memory::Memory;

fn push_segment(cpu: &mut dyn CpuRegs, mem: &mut Memory, seg: Register) -> Result<(), MemoryError> {
    let value = cpu.reg(seg) as u16;
    push16(cpu, mem, value)
}

fn pop_segment(cpu: &mut dyn CpuRegs, mem: &Memory, seg: Register) -> Result<(), MemoryError> {
    let value = pop16(cpu, mem)?;
    cpu.set_reg(seg, value as u32);
    Ok(())
}

pub(crate) fn op_push_es(
    cpu: &mut dyn CpuRegs,
    mem: &mut Memory,
    _opcode: &mut Opcode,
    _config: &CpuConfig,
) -> Result<(), MemoryError> {
    push_segment(cpu, mem, Register::Es)
}

pub(crate) fn op_pop_es(
    cpu: &mut dyn CpuRegs,
    mem: &mut Memory,
    _opcode: &mut Opcode,
    _config: &CpuConfig,
) -> Result<(), MemoryError> {
    pop_segment(cpu, mem, Register::Es)
}

pub(crate) fn op_push_cs(
    cpu: &mut dyn CpuRegs,
    mem: &mut Memory,
    _opcode: &mut Opcode,
    _config: &CpuConfig,
) -> Result<(), MemoryError> {
    push_segment(cpu, mem, Register::Cs)
}

pub(crate) fn op_push_ss(
    cpu: &mut dyn CpuRegs,
    mem: &mut Memory,
    _opcode: &mut Opcode,
    _config: &CpuConfig,
) -> Result<(), MemoryError> {
    push_segment(cpu, mem, Register::Ss)
}

pub(crate) fn op_pop_ss(
    cpu: &mut dyn CpuRegs,
    mem: &mut Memory,
    _opcode: &mut Opcode,
    _config: &CpuConfig,
) -> Result<(), MemoryError> {
    pop_segment(cpu, mem, Register::Ss)
}

pub(crate) fn op_hlt(
    cpu: &mut dyn CpuRegs,
    _mem: &mut Memory,
    _opcode: &mut Opcode,
    _config: &CpuConfig,
) -> Result<(), MemoryError> {
    cpu.set_halted(true);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::cpu::state::Register;
    use crate::test_utils::cpu_with_program;

    #[test]
    fn push_es_pop_ss_moves_segment_value() {
        // PUSH ES ; POP SS
        let mut cpu = cpu_with_program(&[0x06, 0x17]);
        cpu.set_reg(Register::Es, 0x1234);
        cpu.cycle().unwrap();
        assert_eq!(cpu.reg(Register::Sp), 0xFFFD);
        assert_eq!(cpu.memory().read_u16(0xFFFD).unwrap(), 0x1234);
        cpu.cycle().unwrap();
        assert_eq!(cpu.reg(Register::Ss), 0x1234);
        assert_eq!(cpu.reg(Register::Sp), 0xFFFF);
        assert_eq!(cpu.eip(), 2);
    }

    #[test]
    fn push_cs_and_ss_stack_downwards() {
        let mut cpu = cpu_with_program(&[0x0E, 0x16, 0x07]);
        cpu.set_reg(Register::Cs, 0xAAAA);
        cpu.set_reg(Register::Ss, 0x5555);
        cpu.cycle().unwrap();
        cpu.cycle().unwrap();
        assert_eq!(cpu.reg(Register::Sp), 0xFFFB);
        assert_eq!(cpu.memory().read_u16(0xFFFD).unwrap(), 0xAAAA);
        assert_eq!(cpu.memory().read_u16(0xFFFB).unwrap(), 0x5555);
        // POP ES takes the most recent push.
        cpu.cycle().unwrap();
        assert_eq!(cpu.reg(Register::Es), 0x5555);
        assert_eq!(cpu.reg(Register::Sp), 0xFFFD);
    }

    #[test]
    fn sp_wraps_within_low_word() {
        let mut cpu = cpu_with_program(&[0x06]);
        cpu.set_reg(Register::Esp, 0x0001_0001);
        cpu.set_reg(Register::Es, 0xBEEF);
        cpu.cycle().unwrap();
        // SP 0x0001 - 2 wraps to 0xFFFF; the upper half of ESP is kept.
        assert_eq!(cpu.reg(Register::Esp), 0x0001_FFFF);
    }

    #[test]
    fn hlt_latches_and_keeps_eip() {
        let mut cpu = cpu_with_program(&[0xF4, 0x04, 0x01]);
        cpu.cycle().unwrap();
        assert!(cpu.is_halted());
        assert_eq!(cpu.eip(), 0);
        cpu.cycle().unwrap();
        assert_eq!(cpu.eip(), 0);
        assert_eq!(cpu.reg(Register::Al), 0);
    }
}
