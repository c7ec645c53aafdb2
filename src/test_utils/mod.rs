//! Shared test utilities for building CPUs preloaded with small programs.
//!
//! These helpers de-duplicate setup across the dispatch, core and family
//! handler tests. Programs are raw machine code placed at address 0; the
//! returned CPU has the reset register image applied and EIP = 0.

#![allow(dead_code)]

use crate::config::CpuConfig;
use crate::cpu::core::Cpu;

/// Real-mode CPU (default config) with `program` loaded at address 0.
pub fn cpu_with_program(program: &[u8]) -> Cpu {
    cpu_with_program_in(CpuConfig::default(), program)
}

/// CPU built from `config` with `program` loaded at address 0.
pub fn cpu_with_program_in(config: CpuConfig, program: &[u8]) -> Cpu {
    let mut cpu = Cpu::new(config);
    cpu.load_image(program).expect("program fits in memory");
    cpu
}

/// Encode a ModR/M byte from its three fields.
pub const fn modrm(mode: u8, reg: u8, rm: u8) -> u8 {
    (mode << 6) | ((reg & 0b111) << 3) | (rm & 0b111)
}

/// Encode a SIB byte from its three fields.
pub const fn sib(scale: u8, index: u8, base: u8) -> u8 {
    (scale << 6) | ((index & 0b111) << 3) | (base & 0b111)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoders_match_known_bytes() {
        assert_eq!(modrm(0b11, 0, 0), 0xC0);
        assert_eq!(modrm(0b01, 0b100, 0b000), 0x60);
        assert_eq!(sib(0b01, 0b001, 0b000), 0x48);
    }

    #[test]
    fn program_is_loaded_at_zero() {
        let cpu = cpu_with_program(&[0xF4, 0x90]);
        assert_eq!(cpu.memory().read_u16(0).unwrap(), 0x90F4);
        assert_eq!(cpu.eip(), 0);
    }
}
