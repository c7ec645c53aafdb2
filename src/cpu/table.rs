/*!
table.rs - Table-driven dispatcher using a function-pointer table.

Purpose
=======
Maps each opcode byte to a handler function. The table is built at compile
time and never mutated.

Design
------
- Table: [Option<OpHandler>; 256], where
  `OpHandler = fn(&mut dyn CpuRegs, &mut Memory, &mut Opcode, &CpuConfig) -> Result<(), MemoryError>`.
- Handlers start with EIP on the opcode byte, consume the rest of the
  instruction through the `addressing` fetch helpers and return. The
  trailing increment belongs to the dispatcher.
- `None` entries are unimplemented; the dispatcher reports them and moves on.
  0x0F (two-byte escape) is deliberately left empty.

Mapped Opcodes
--------------
0x00-0x05 ADD    0x06 PUSH ES   0x07 POP ES
0x08-0x0D OR     0x0E PUSH CS
0x10-0x15 ADC    0x16 PUSH SS   0x17 POP SS
0xF4      HLT
*/

use crate::config::CpuConfig;
use crate::cpu::dispatch::{arithmetic as arith, logical, misc};
use crate::cpu::opcode::Opcode;
use crate::cpu::regs::CpuRegs;
use crate::error::MemoryError;
use crate::memory::Memory;

pub(crate) type OpHandler =
    fn(&mut dyn CpuRegs, &mut Memory, &mut Opcode, &CpuConfig) -> Result<(), MemoryError>;

/// Handler for `opcode`, if one is mapped.
#[inline]
pub(crate) fn lookup(opcode: u8) -> Option<OpHandler> {
    EXEC_TABLE[opcode as usize]
}

/// True when `opcode` has a handler.
pub fn is_implemented(opcode: u8) -> bool {
    lookup(opcode).is_some()
}

// ------------------------------------------
// Dispatch Table (256 entries)
// ------------------------------------------

static EXEC_TABLE: [Option<OpHandler>; 256] = {
    let mut t: [Option<OpHandler>; 256] = [None; 256];

    // ADD
    t[0x00] = Some(arith::op_add_rm8_r8);
    t[0x01] = Some(arith::op_add_rm_r);
    t[0x02] = Some(arith::op_add_r8_rm8);
    t[0x03] = Some(arith::op_add_r_rm);
    t[0x04] = Some(arith::op_add_al_imm8);
    t[0x05] = Some(arith::op_add_eax_imm);

    // OR
    t[0x08] = Some(logical::op_or_rm8_r8);
    t[0x09] = Some(logical::op_or_rm_r);
    t[0x0A] = Some(logical::op_or_r8_rm8);
    t[0x0B] = Some(logical::op_or_r_rm);
    t[0x0C] = Some(logical::op_or_al_imm8);
    t[0x0D] = Some(logical::op_or_eax_imm);

    // ADC
    t[0x10] = Some(arith::op_adc_rm8_r8);
    t[0x11] = Some(arith::op_adc_rm_r);
    t[0x12] = Some(arith::op_adc_r8_rm8);
    t[0x13] = Some(arith::op_adc_r_rm);
    t[0x14] = Some(arith::op_adc_al_imm8);
    t[0x15] = Some(arith::op_adc_eax_imm);

    // Segment stack
    t[0x06] = Some(misc::op_push_es);
    t[0x07] = Some(misc::op_pop_es);
    t[0x0E] = Some(misc::op_push_cs);
    t[0x16] = Some(misc::op_push_ss);
    t[0x17] = Some(misc::op_pop_ss);

    // Control
    t[0xF4] = Some(misc::op_hlt);

    t
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_opcode_set() {
        let mapped: Vec<u8> = (0u8..=0xFF).filter(|&b| is_implemented(b)).collect();
        let expected: Vec<u8> = (0x00..=0x0E)
            .chain(0x10..=0x17)
            .chain(std::iter::once(0xF4))
            .collect();
        assert_eq!(mapped, expected);
    }

    #[test]
    fn escape_byte_is_unmapped() {
        assert!(!is_implemented(0x0F));
        assert!(!is_implemented(0x90));
    }
}
