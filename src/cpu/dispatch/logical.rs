/*!
logical.rs - OR opcode family handlers

Overview
========
OR: 0x08 r/m8,r8   0x09 r/m16/32,r16/32   0x0A r8,r/m8
    0x0B r16/32,r/m16/32   0x0C AL,imm8   0x0D eAX,imm16/32

Flags
=====
SF, ZF and PF from the result; CF and OF always cleared; AF untouched
(see `execute::or`).
*/

use crate::cpu::dispatch::{Form, Width};
use crate::cpu::execute::AluOp;

alu_handler!(op_or_rm8_r8, AluOp::Or, Form::RmReg, Width::Byte);
alu_handler!(op_or_rm_r, AluOp::Or, Form::RmReg, Width::Full);
alu_handler!(op_or_r8_rm8, AluOp::Or, Form::RegRm, Width::Byte);
alu_handler!(op_or_r_rm, AluOp::Or, Form::RegRm, Width::Full);
alu_handler!(op_or_al_imm8, AluOp::Or, Form::AccImm, Width::Byte);
alu_handler!(op_or_eax_imm, AluOp::Or, Form::AccImm, Width::Full);
