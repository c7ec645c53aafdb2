/*!
arithmetic.rs - ADD / ADC opcode family handlers

Overview
========
Implements the x86 add and add-with-carry instructions:

ADD: 0x00 r/m8,r8   0x01 r/m16/32,r16/32   0x02 r8,r/m8
     0x03 r16/32,r/m16/32   0x04 AL,imm8   0x05 eAX,imm16/32
ADC: 0x10 .. 0x15 (same layout)

Responsibilities
================
- Select the operand form and width, then hand off to `dispatch::binary_op`.
- Flags come from `execute::add` / `execute::adc`.

Caller Requirements
===================
The dispatcher must leave EIP on the opcode byte and apply the trailing
increment after a successful return.
*/

use crate::cpu::dispatch::{Form, Width};
use crate::cpu::execute::AluOp;

// ---------------- ADD ----------------
alu_handler!(op_add_rm8_r8, AluOp::Add, Form::RmReg, Width::Byte);
alu_handler!(op_add_rm_r, AluOp::Add, Form::RmReg, Width::Full);
alu_handler!(op_add_r8_rm8, AluOp::Add, Form::RegRm, Width::Byte);
alu_handler!(op_add_r_rm, AluOp::Add, Form::RegRm, Width::Full);
alu_handler!(op_add_al_imm8, AluOp::Add, Form::AccImm, Width::Byte);
alu_handler!(op_add_eax_imm, AluOp::Add, Form::AccImm, Width::Full);

// ---------------- ADC ----------------
alu_handler!(op_adc_rm8_r8, AluOp::Adc, Form::RmReg, Width::Byte);
alu_handler!(op_adc_rm_r, AluOp::Adc, Form::RmReg, Width::Full);
alu_handler!(op_adc_r8_rm8, AluOp::Adc, Form::RegRm, Width::Byte);
alu_handler!(op_adc_r_rm, AluOp::Adc, Form::RegRm, Width::Full);
alu_handler!(op_adc_al_imm8, AluOp::Adc, Form::AccImm, Width::Byte);
alu_handler!(op_adc_eax_imm, AluOp::Adc, Form::AccImm, Width::Full);

#[cfg(test)]
mod tests {
    use crate::config::CpuConfig;
    use crate::cpu::state::{Flag, Register};
    use crate::test_utils::{cpu_with_program, cpu_with_program_in};

    #[test]
    fn add_rm8_r8_register_form_sets_carry() {
        // ADD AL, CL
        let mut cpu = cpu_with_program(&[0x00, 0xC8]);
        cpu.set_reg(Register::Al, 0xFF);
        cpu.set_reg(Register::Cl, 0x01);
        cpu.cycle().unwrap();
        assert_eq!(cpu.reg(Register::Al), 0x00);
        assert!(cpu.flag(Flag::Cf));
        assert!(cpu.flag(Flag::Zf));
        assert!(cpu.flag(Flag::Pf));
        assert!(!cpu.flag(Flag::Sf));
        assert!(!cpu.flag(Flag::Of));
        assert_eq!(cpu.eip(), 2);
    }

    #[test]
    fn add_rm8_r8_memory_destination() {
        // ADD [BX+SI+0x10], AH
        let mut cpu = cpu_with_program(&[0x00, 0x60, 0x10]);
        cpu.set_reg(Register::Bx, 0x0200);
        cpu.set_reg(Register::Si, 0x0004);
        cpu.set_reg(Register::Ah, 0x21);
        cpu.memory_mut().write_u8(0x0214, 0x11).unwrap();
        cpu.cycle().unwrap();
        assert_eq!(cpu.memory().read_u8(0x0214).unwrap(), 0x32);
        assert_eq!(cpu.reg(Register::Ah), 0x21);
        assert_eq!(cpu.eip(), 3);
    }

    #[test]
    fn add_r16_rm16_reads_word_from_memory() {
        // ADD DX, [0x0300]
        let mut cpu = cpu_with_program(&[0x03, 0x16, 0x00, 0x03]);
        cpu.set_reg(Register::Edx, 0xFFFF_0001);
        cpu.memory_mut().write_u16(0x0300, 0x1234).unwrap();
        cpu.cycle().unwrap();
        assert_eq!(cpu.reg(Register::Edx), 0xFFFF_1235);
        assert_eq!(cpu.eip(), 4);
    }

    #[test]
    fn add_al_imm8() {
        let mut cpu = cpu_with_program(&[0x04, 0x7F]);
        cpu.set_reg(Register::Al, 0x01);
        cpu.cycle().unwrap();
        assert_eq!(cpu.reg(Register::Al), 0x80);
        assert!(cpu.flag(Flag::Sf));
        assert!(cpu.flag(Flag::Af));
        assert_eq!(cpu.eip(), 2);
    }

    #[test]
    fn add_ax_imm16_in_real_mode() {
        let mut cpu = cpu_with_program(&[0x05, 0x00, 0x01]);
        cpu.set_reg(Register::Eax, 0x0005_00FF);
        cpu.cycle().unwrap();
        assert_eq!(cpu.reg(Register::Eax), 0x0005_01FF);
        assert_eq!(cpu.eip(), 3);
    }

    #[test]
    fn add_rm32_r32_with_sib_in_flat_mode() {
        // ADD [EAX + ECX*2], EDX
        let mut cpu = cpu_with_program_in(CpuConfig::i386_protected_flat(), &[0x01, 0x14, 0x48]);
        cpu.set_reg(Register::Eax, 0x400);
        cpu.set_reg(Register::Ecx, 0x8);
        cpu.set_reg(Register::Edx, 0x0000_0010);
        cpu.memory_mut().write_u32(0x410, 0xFFFF_FFF8).unwrap();
        cpu.cycle().unwrap();
        assert_eq!(cpu.memory().read_u32(0x410).unwrap(), 0x0000_0008);
        assert!(cpu.flag(Flag::Cf));
        assert_eq!(cpu.eip(), 3);
    }

    #[test]
    fn adc_adds_carry_in() {
        // ADC AL, BL
        let mut cpu = cpu_with_program(&[0x12, 0xC3]);
        cpu.set_flag(Flag::Cf, true);
        cpu.set_reg(Register::Al, 0x10);
        cpu.set_reg(Register::Bl, 0x20);
        cpu.cycle().unwrap();
        assert_eq!(cpu.reg(Register::Al), 0x31);
        assert!(!cpu.flag(Flag::Cf));
    }

    #[test]
    fn adc_chain_propagates_carry_across_words() {
        // ADD AX, CX ; ADC DX, BX   (32-bit add of DX:AX + BX:CX)
        let mut cpu = cpu_with_program(&[0x01, 0xC8, 0x11, 0xDA]);
        cpu.set_reg(Register::Ax, 0xFFFF);
        cpu.set_reg(Register::Dx, 0x0001);
        cpu.set_reg(Register::Cx, 0x0002);
        cpu.set_reg(Register::Bx, 0x0003);
        cpu.cycle().unwrap();
        cpu.cycle().unwrap();
        assert_eq!(cpu.reg(Register::Ax), 0x0001);
        assert_eq!(cpu.reg(Register::Dx), 0x0005);
        assert_eq!(cpu.eip(), 4);
    }

    #[test]
    fn adc_eax_imm32_with_operand_prefix() {
        let mut cpu = cpu_with_program(&[0x66, 0x15, 0x01, 0x00, 0x00, 0x00]);
        cpu.set_flag(Flag::Cf, true);
        cpu.set_reg(Register::Eax, 0x0000_FFFE);
        cpu.cycle().unwrap();
        assert_eq!(cpu.reg(Register::Eax), 0x0001_0000);
        assert_eq!(cpu.eip(), 6);
    }

    #[test]
    fn adc_rm8_r8_memory_destination() {
        // ADC [DI], CL
        let mut cpu = cpu_with_program(&[0x10, 0x0D]);
        cpu.set_flag(Flag::Cf, true);
        cpu.set_reg(Register::Di, 0x0500);
        cpu.set_reg(Register::Cl, 0x01);
        cpu.memory_mut().write_u8(0x0500, 0x7E).unwrap();
        cpu.cycle().unwrap();
        assert_eq!(cpu.memory().read_u8(0x0500).unwrap(), 0x80);
        assert!(cpu.flag(Flag::Sf));
    }
}
