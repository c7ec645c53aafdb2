/*!
core::Cpu - Canonical x86 CPU façade wrapping `CpuState` and `Memory`.

Design
======
- `Cpu` owns the architectural state (`CpuState`), the flat memory it
  executes from, its `CpuConfig` capability set and the `DiagContext`
  clock used for diagnostics.
- Execution goes through the table dispatcher (`cpu::dispatch::cycle`);
  this type only adds lifecycle management and accessors.
- Errors are reported as `crate::Error`. A failed cycle leaves registers
  and flags exactly as they were before it started.

Lifecycle
=========
`new(config)` -> `reset()` -> `load_image(bytes)` -> `cycle()` while
`!is_halted()`. `run(max_cycles)` wraps that loop. Registers, flags and
memory may be inspected or changed between cycles.
*/

use crate::config::CpuConfig;
use crate::cpu::dispatch::{self, Step};
use crate::cpu::state::{CpuState, Flag, Register};
use crate::diag::DiagContext;
use crate::error::{Error, Result};
use crate::memory::Memory;

#[derive(Debug, Clone)]
pub struct Cpu {
    state: CpuState,
    memory: Memory,
    config: CpuConfig,
    diag: DiagContext,
    unimplemented: u64,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new(CpuConfig::default())
    }
}

impl Cpu {
    /// Construct a CPU with zeroed memory of `config.memory_size` bytes and
    /// the reset register image applied.
    pub fn new(config: CpuConfig) -> Self {
        Self::with_diagnostics(config, DiagContext::new())
    }

    /// Like `new`, but timestamps diagnostics against a caller-supplied clock.
    pub fn with_diagnostics(config: CpuConfig, diag: DiagContext) -> Self {
        let mut cpu = Self {
            state: CpuState::new(),
            memory: Memory::new(config.memory_size),
            config,
            diag,
            unimplemented: 0,
        };
        cpu.reset();
        cpu
    }

    /// Apply the reset register image, clear the halted latch and zero the
    /// unimplemented-opcode counter.
    ///
    /// Memory contents are left alone.
    pub fn reset(&mut self) {
        self.state.reset();
        self.unimplemented = 0;
        tracing::debug!(eip = self.state.eip(), "cpu reset");
    }

    /// Copy `image` to address 0.
    pub fn load_image(&mut self, image: &[u8]) -> Result<()> {
        if image.len() > self.memory.size() {
            return Err(Error::ImageTooLarge {
                len: image.len(),
                capacity: self.memory.size(),
            });
        }
        self.memory.load(0, image)?;
        tracing::debug!(len = image.len(), "program image loaded");
        Ok(())
    }

    /// Execute one instruction. No-op once halted.
    pub fn cycle(&mut self) -> Result<()> {
        let step = dispatch::cycle(&mut self.state, &mut self.memory, &self.config, &self.diag)?;
        if step == Step::Unimplemented {
            self.unimplemented += 1;
        }
        Ok(())
    }

    /// Convenience: cycle until halted or `max_cycles` instructions have run.
    /// Returns the number of cycles executed.
    pub fn run(&mut self, max_cycles: usize) -> Result<usize> {
        let mut executed = 0;
        while executed < max_cycles && !self.is_halted() {
            self.cycle()?;
            executed += 1;
        }
        Ok(executed)
    }

    pub fn is_halted(&self) -> bool {
        self.state.halted
    }

    /// Number of opcode bytes without a handler seen since the last reset.
    pub fn unimplemented_count(&self) -> u64 {
        self.unimplemented
    }

    // ---------------------------------------------------------------------
    // Registers / flags
    // ---------------------------------------------------------------------
    pub fn reg(&self, reg: Register) -> u32 {
        self.state.regs.get(reg)
    }

    pub fn set_reg(&mut self, reg: Register, value: u32) {
        self.state.regs.set(reg, value);
    }

    pub fn eip(&self) -> u32 {
        self.state.eip()
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.state.flags.get(flag)
    }

    pub fn set_flag(&mut self, flag: Flag, on: bool) {
        self.state.flags.set(flag, on);
    }

    /// Raw EFLAGS image.
    pub fn eflags(&self) -> u32 {
        self.state.flags.bits()
    }

    // ---------------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------------
    pub fn state(&self) -> &CpuState {
        &self.state
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn config(&self) -> &CpuConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MemoryError;
    use crate::test_utils::cpu_with_program;

    #[test]
    fn construction_applies_reset_image() {
        let cpu = Cpu::default();
        assert_eq!(cpu.eip(), 0);
        assert_eq!(cpu.reg(Register::Esp), 0xFFFF);
        assert_eq!(cpu.eflags(), 0b10);
        assert!(!cpu.is_halted());
        assert_eq!(cpu.memory().size(), 0xF_FFFF);
    }

    #[test]
    fn add_al_al_then_hlt() {
        // ADD AL, AL ; HLT
        let mut cpu = cpu_with_program(&[0x00, 0xC0, 0xF4]);
        cpu.set_reg(Register::Al, 5);
        cpu.cycle().unwrap();
        assert_eq!(cpu.reg(Register::Al), 10);
        assert_eq!(cpu.eip(), 2);
        cpu.cycle().unwrap();
        assert!(cpu.is_halted());
        assert_eq!(cpu.eip(), 2);
    }

    #[test]
    fn unimplemented_opcode_only_moves_eip() {
        let mut cpu = cpu_with_program(&[0x0F, 0x90]);
        cpu.set_reg(Register::Eax, 0x1234);
        cpu.set_reg(Register::Esi, 0x0100);
        cpu.set_flag(Flag::Cf, true);
        let state_before = *cpu.state();
        let memory_before = cpu.memory().clone();

        cpu.cycle().unwrap();
        let mut expected = state_before;
        expected.regs.set(Register::Eip, 1);
        assert_eq!(*cpu.state(), expected);
        assert_eq!(*cpu.memory(), memory_before);
        assert_eq!(cpu.unimplemented_count(), 1);
        assert!(!cpu.is_halted());

        cpu.cycle().unwrap();
        expected.regs.set(Register::Eip, 2);
        assert_eq!(*cpu.state(), expected);
        assert_eq!(*cpu.memory(), memory_before);
        assert_eq!(cpu.unimplemented_count(), 2);
    }

    #[test]
    fn unknown_byte_then_hlt_changes_nothing_but_eip() {
        // D6 ; HLT
        let mut cpu = cpu_with_program(&[0xD6, 0xF4]);
        cpu.set_reg(Register::Ebx, 0xDEAD_BEEF);
        cpu.set_reg(Register::Esp, 0x8000);
        cpu.set_flag(Flag::Zf, true);
        cpu.memory_mut().write_u32(0x0200, 0x1122_3344).unwrap();
        let state_before = *cpu.state();
        let memory_before = cpu.memory().clone();

        cpu.cycle().unwrap();
        cpu.cycle().unwrap();

        let mut expected = state_before;
        expected.regs.set(Register::Eip, 1);
        expected.halted = true;
        assert_eq!(*cpu.state(), expected);
        assert_eq!(*cpu.memory(), memory_before);
        assert_eq!(cpu.unimplemented_count(), 1);
    }

    #[test]
    fn reset_clears_unimplemented_count() {
        let mut cpu = cpu_with_program(&[0xD6, 0xD6]);
        cpu.run(2).unwrap();
        assert_eq!(cpu.unimplemented_count(), 2);
        cpu.reset();
        assert_eq!(cpu.unimplemented_count(), 0);
        assert_eq!(cpu.eip(), 0);
    }

    #[test]
    fn run_stops_at_hlt() {
        let mut cpu = cpu_with_program(&[0x04, 0x01, 0x04, 0x01, 0xF4, 0x04, 0x01]);
        let executed = cpu.run(100).unwrap();
        assert_eq!(executed, 3);
        assert_eq!(cpu.reg(Register::Al), 2);
        assert!(cpu.is_halted());
    }

    #[test]
    fn run_respects_cycle_cap() {
        let mut cpu = cpu_with_program(&[0x04, 0x01, 0x04, 0x01, 0x04, 0x01]);
        assert_eq!(cpu.run(2).unwrap(), 2);
        assert_eq!(cpu.reg(Register::Al), 2);
        assert_eq!(cpu.eip(), 4);
    }

    #[test]
    fn reset_clears_halt_but_keeps_memory() {
        let mut cpu = cpu_with_program(&[0xF4]);
        cpu.cycle().unwrap();
        assert!(cpu.is_halted());
        cpu.reset();
        assert!(!cpu.is_halted());
        assert_eq!(cpu.memory().read_u8(0).unwrap(), 0xF4);
    }

    #[test]
    fn image_larger_than_memory_is_rejected() {
        let mut cpu = Cpu::new(CpuConfig::default().with_memory_size(4));
        let err = cpu.load_image(&[0; 5]).unwrap_err();
        assert_eq!(err, Error::ImageTooLarge { len: 5, capacity: 4 });
    }

    #[test]
    fn out_of_range_operand_rolls_back_cycle() {
        // ADD AL, [0xFFF0] with only 16 bytes of memory.
        let mut cpu = Cpu::new(CpuConfig::default().with_memory_size(0x10));
        cpu.load_image(&[0x02, 0x06, 0xF0, 0xFF]).unwrap();
        cpu.set_reg(Register::Al, 7);
        let before = *cpu.state();

        let err = cpu.cycle().unwrap_err();
        assert!(matches!(
            err,
            Error::Memory(MemoryError::AddressOutOfRange { address: 0xFFF0, .. })
        ));
        assert_eq!(*cpu.state(), before);
        assert_eq!(cpu.eip(), 0);
    }

    #[test]
    fn running_off_the_end_of_memory_is_an_error() {
        let mut cpu = Cpu::new(CpuConfig::default().with_memory_size(2));
        cpu.load_image(&[0x04, 0x01]).unwrap();
        cpu.cycle().unwrap();
        assert_eq!(cpu.eip(), 2);
        assert!(cpu.cycle().is_err());
        assert_eq!(cpu.eip(), 2);
    }
}
