/*!
addressing.rs - x86 ModR/M + SIB decoding and operand fetch helpers

Overview
========
Provides canonical helpers for:
- Instruction stream byte/word/dword fetch
- ModR/M decomposition into the per-cycle `Opcode` record
- Operand resolution for both ModR/M sides, in 16-bit and 32-bit addressing
- SIB (scale-index-base) address computation
- Reading / writing a resolved operand

Caller Assumptions
==================
EIP always points at the LAST byte consumed so far. The prefix scanner
leaves it on the opcode byte; every fetch helper reads at EIP+1 and then
advances EIP by the number of bytes read. The dispatcher's single trailing
increment moves EIP past the final byte of the instruction.

Handlers advance EIP exclusively via these helpers (no manual EIP arithmetic
inside handlers). The rm side of a ModR/M byte consumes displacement bytes,
so it must be resolved exactly once per instruction.

16-bit Effective Addresses
==========================
```text
rm   mod=00        mod=01           mod=10
000  BX+SI         BX+SI+disp8      BX+SI+disp16
001  BX+DI         BX+DI+disp8      BX+DI+disp16
010  BP+SI         BP+SI+disp8      BP+SI+disp16
011  BP+DI         BP+DI+disp8      BP+DI+disp16
100  SI            SI+disp8         SI+disp16
101  DI            DI+disp8         DI+disp16
110  disp16        BP+disp8         BP+disp16
111  BX            BX+disp8         BX+disp16
```
disp8 is sign-extended; the sum wraps at 16 bits.

32-bit Effective Addresses
==========================
Same shape over EAX..EDI, except rm=100 reads a SIB byte and rm=101/mod=00
is a bare disp32. disp8 is sign-extended; the sum wraps at 32 bits.
*/

use crate::config::{AddressSize, OperandSize};
use crate::cpu::opcode::{ModRm, Opcode, Sib};
use crate::cpu::regs::CpuRegs;
use crate::cpu::state::{REG32, Register};
use crate::error::MemoryError;
use crate::memory::Memory;

/// Which ModR/M field an operand comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Reg,
    Rm,
}

/// A resolved instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Register(Register),
    Memory(u32),
}

// -------------------------
// Instruction stream fetch
// -------------------------

/// Fetch the next byte from the instruction stream, advancing EIP by 1.
pub(crate) fn fetch_u8<C: CpuRegs + ?Sized>(cpu: &mut C, mem: &Memory) -> Result<u8, MemoryError> {
    let v = mem.read_u8(cpu.eip().wrapping_add(1))?;
    cpu.advance_ip(1);
    Ok(v)
}

/// Fetch the next little-endian word, advancing EIP by 2.
pub(crate) fn fetch_u16<C: CpuRegs + ?Sized>(
    cpu: &mut C,
    mem: &Memory,
) -> Result<u16, MemoryError> {
    let v = mem.read_u16(cpu.eip().wrapping_add(1))?;
    cpu.advance_ip(2);
    Ok(v)
}

/// Fetch the next little-endian dword, advancing EIP by 4.
pub(crate) fn fetch_u32<C: CpuRegs + ?Sized>(
    cpu: &mut C,
    mem: &Memory,
) -> Result<u32, MemoryError> {
    let v = mem.read_u32(cpu.eip().wrapping_add(1))?;
    cpu.advance_ip(4);
    Ok(v)
}

/// Fetch an immediate of the given operand width (zero-extended).
pub(crate) fn fetch_imm<C: CpuRegs + ?Sized>(
    cpu: &mut C,
    mem: &Memory,
    size: OperandSize,
) -> Result<u32, MemoryError> {
    Ok(match size {
        OperandSize::Byte => fetch_u8(cpu, mem)? as u32,
        OperandSize::Word => fetch_u16(cpu, mem)? as u32,
        OperandSize::Dword => fetch_u32(cpu, mem)?,
    })
}

// -------------------------
// ModR/M
// -------------------------

/// Read the ModR/M byte at `address` and record its fields in `opcode`.
pub fn parse_modrm(opcode: &mut Opcode, mem: &Memory, address: u32) -> Result<ModRm, MemoryError> {
    let modrm = ModRm::from_byte(mem.read_u8(address)?);
    opcode.modrm = Some(modrm);
    Ok(modrm)
}

/// Consume the ModR/M byte following the opcode.
pub(crate) fn fetch_modrm<C: CpuRegs + ?Sized>(
    cpu: &mut C,
    mem: &Memory,
    opcode: &mut Opcode,
) -> Result<ModRm, MemoryError> {
    let modrm = parse_modrm(opcode, mem, cpu.eip().wrapping_add(1))?;
    cpu.advance_ip(1);
    Ok(modrm)
}

/// Resolve one side of the already-parsed ModR/M byte.
///
/// The reg side and a register-direct rm side yield a register of `size`.
/// A memory rm side yields its effective address, consuming any SIB and
/// displacement bytes from the instruction stream.
pub fn resolve_operand<C: CpuRegs + ?Sized>(
    cpu: &mut C,
    mem: &Memory,
    opcode: &mut Opcode,
    mode: AddressSize,
    side: Side,
    size: OperandSize,
) -> Result<Operand, MemoryError> {
    let modrm = opcode.modrm();
    match side {
        Side::Reg => Ok(Operand::Register(Register::from_encoding(modrm.reg, size))),
        Side::Rm if modrm.is_register_direct() => {
            Ok(Operand::Register(Register::from_encoding(modrm.rm, size)))
        }
        Side::Rm => {
            let addr = match mode {
                AddressSize::Addr16 => effective_address_16(cpu, mem, modrm)?,
                AddressSize::Addr32 => effective_address_32(cpu, mem, opcode)?,
            };
            Ok(Operand::Memory(addr))
        }
    }
}

fn effective_address_16<C: CpuRegs + ?Sized>(
    cpu: &mut C,
    mem: &Memory,
    modrm: ModRm,
) -> Result<u32, MemoryError> {
    if modrm.mode == 0b00 && modrm.rm == 0b110 {
        return Ok(fetch_u16(cpu, mem)? as u32);
    }
    let r = |reg| cpu.reg(reg) as u16;
    let base = match modrm.rm {
        0b000 => r(Register::Bx).wrapping_add(r(Register::Si)),
        0b001 => r(Register::Bx).wrapping_add(r(Register::Di)),
        0b010 => r(Register::Bp).wrapping_add(r(Register::Si)),
        0b011 => r(Register::Bp).wrapping_add(r(Register::Di)),
        0b100 => r(Register::Si),
        0b101 => r(Register::Di),
        0b110 => r(Register::Bp),
        _ => r(Register::Bx),
    };
    let disp = match modrm.mode {
        0b01 => fetch_u8(cpu, mem)? as i8 as i16 as u16,
        0b10 => fetch_u16(cpu, mem)?,
        _ => 0,
    };
    Ok(base.wrapping_add(disp) as u32)
}

fn effective_address_32<C: CpuRegs + ?Sized>(
    cpu: &mut C,
    mem: &Memory,
    opcode: &mut Opcode,
) -> Result<u32, MemoryError> {
    let modrm = opcode.modrm();
    let base = match modrm.rm {
        0b100 => resolve_sib(cpu, mem, opcode)?,
        0b101 if modrm.mode == 0b00 => return fetch_u32(cpu, mem),
        rm => cpu.reg(REG32[rm as usize]),
    };
    let disp = match modrm.mode {
        0b01 => fetch_u8(cpu, mem)? as i8 as i32 as u32,
        0b10 => fetch_u32(cpu, mem)?,
        _ => 0,
    };
    Ok(base.wrapping_add(disp))
}

// -------------------------
// SIB
// -------------------------

/// Consume a SIB byte and compute `base + index * 2^scale`.
///
/// The ModR/M displacement (mod=01/10) is NOT included; the caller adds it.
/// For base=101/mod=00 the disp32 that replaces the base register is read
/// here.
pub fn resolve_sib<C: CpuRegs + ?Sized>(
    cpu: &mut C,
    mem: &Memory,
    opcode: &mut Opcode,
) -> Result<u32, MemoryError> {
    let sib = Sib::from_byte(fetch_u8(cpu, mem)?);
    opcode.sib = Some(sib);

    let index = sib
        .index_register()
        .map(|r| cpu.reg(r).wrapping_shl(sib.scale as u32))
        .unwrap_or(0);
    let base = match sib.base_register(opcode.modrm().mode) {
        Some(r) => cpu.reg(r),
        None => fetch_u32(cpu, mem)?,
    };
    Ok(base.wrapping_add(index))
}

// -------------------------
// Operand access
// -------------------------

pub(crate) fn read_operand<C: CpuRegs + ?Sized>(
    cpu: &C,
    mem: &Memory,
    operand: Operand,
    size: OperandSize,
) -> Result<u32, MemoryError> {
    match operand {
        Operand::Register(r) => Ok(cpu.reg(r) & size.mask()),
        Operand::Memory(addr) => Ok(match size {
            OperandSize::Byte => mem.read_u8(addr)? as u32,
            OperandSize::Word => mem.read_u16(addr)? as u32,
            OperandSize::Dword => mem.read_u32(addr)?,
        }),
    }
}

pub(crate) fn write_operand<C: CpuRegs + ?Sized>(
    cpu: &mut C,
    mem: &mut Memory,
    operand: Operand,
    size: OperandSize,
    value: u32,
) -> Result<(), MemoryError> {
    match operand {
        Operand::Register(r) => {
            cpu.set_reg(r, value & size.mask());
            Ok(())
        }
        Operand::Memory(addr) => match size {
            OperandSize::Byte => mem.write_u8(addr, value as u8),
            OperandSize::Word => mem.write_u16(addr, value as u16),
            OperandSize::Dword => mem.write_u32(addr, value),
        },
    }
}
