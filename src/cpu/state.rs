/*!
state.rs - Canonical x86 architectural state (registers + flags) and
inline-friendly helpers.

Overview
========
`CpuState` is the single authoritative owner for all architecturally visible
registers, the flag store, and the halted latch. It excludes:
  - Memory
  - Instruction decode / dispatch logic
  - Configuration and diagnostics
Those live in higher layers (addressing, dispatch, core modules).

Register File Layout
====================
Nine 32-bit slots back every general-purpose view plus the instruction
pointer; six independent 16-bit slots hold the segment registers.

```text
slot  32-bit  16-bit  8-bit low  8-bit high
0     EAX     AX      AL         AH
1     ECX     CX      CL         CH
2     EDX     DX      DL         DH
3     EBX     BX      BL         BH
4     ESP     SP      -          -
5     EBP     BP      -          -
6     ESI     SI      -          -
7     EDI     DI      -          -
8     EIP     IP      -          -
```

Sub-width views are bit slices, not separate storage: a write masks the
value to the view's width and merges it into the owning slot, leaving every
other bit untouched.

EFLAGS Bit Layout (for reference)
=================================
```text
Bit: 17 16 15 14 13-12 11 10 9 8 7 6 5 4 3 2 1 0
     VM RF 0  NT IOPL  OF DF IF TF SF ZF 0 AF 0 PF 1 CF
```
Bits 1 and 15 are forced to their hardware reset image (1 and 0) by `reset`;
all other reserved positions remain addressable through the raw bit API.
*/

use std::fmt;

use crate::config::OperandSize;

// -------------------------------------------------------------------------
// Registers
// -------------------------------------------------------------------------

/// Every architectural register name, including sub-width views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Eax,
    Ecx,
    Edx,
    Ebx,
    Esp,
    Ebp,
    Esi,
    Edi,
    Eip,

    Ax,
    Cx,
    Dx,
    Bx,

    Al,
    Cl,
    Dl,
    Bl,
    Ah,
    Ch,
    Dh,
    Bh,

    Sp,
    Bp,
    Si,
    Di,
    Ip,

    Cs,
    Ds,
    Es,
    Fs,
    Gs,
    Ss,
}

/// Where a register view lives in the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Full(usize),
    Low16(usize),
    Low8(usize),
    High8(usize),
    Segment(usize),
}

/// Register-field encodings (ModR/M `reg`/`rm`, SIB base/index), by width.
pub const REG8: [Register; 8] = [
    Register::Al,
    Register::Cl,
    Register::Dl,
    Register::Bl,
    Register::Ah,
    Register::Ch,
    Register::Dh,
    Register::Bh,
];
pub const REG16: [Register; 8] = [
    Register::Ax,
    Register::Cx,
    Register::Dx,
    Register::Bx,
    Register::Sp,
    Register::Bp,
    Register::Si,
    Register::Di,
];
pub const REG32: [Register; 8] = [
    Register::Eax,
    Register::Ecx,
    Register::Edx,
    Register::Ebx,
    Register::Esp,
    Register::Ebp,
    Register::Esi,
    Register::Edi,
];

impl Register {
    /// Select a general-purpose register from a 3-bit encoding.
    #[inline]
    pub fn from_encoding(index: u8, size: OperandSize) -> Register {
        let i = (index & 0b111) as usize;
        match size {
            OperandSize::Byte => REG8[i],
            OperandSize::Word => REG16[i],
            OperandSize::Dword => REG32[i],
        }
    }

    /// Width of the view.
    pub fn size(self) -> OperandSize {
        match self.view() {
            View::Full(_) => OperandSize::Dword,
            View::Low16(_) | View::Segment(_) => OperandSize::Word,
            View::Low8(_) | View::High8(_) => OperandSize::Byte,
        }
    }

    pub fn is_segment(self) -> bool {
        matches!(self.view(), View::Segment(_))
    }

    pub fn name(self) -> &'static str {
        use Register::*;
        match self {
            Eax => "EAX",
            Ecx => "ECX",
            Edx => "EDX",
            Ebx => "EBX",
            Esp => "ESP",
            Ebp => "EBP",
            Esi => "ESI",
            Edi => "EDI",
            Eip => "EIP",
            Ax => "AX",
            Cx => "CX",
            Dx => "DX",
            Bx => "BX",
            Al => "AL",
            Cl => "CL",
            Dl => "DL",
            Bl => "BL",
            Ah => "AH",
            Ch => "CH",
            Dh => "DH",
            Bh => "BH",
            Sp => "SP",
            Bp => "BP",
            Si => "SI",
            Di => "DI",
            Ip => "IP",
            Cs => "CS",
            Ds => "DS",
            Es => "ES",
            Fs => "FS",
            Gs => "GS",
            Ss => "SS",
        }
    }

    fn view(self) -> View {
        use Register::*;
        match self {
            Eax => View::Full(0),
            Ecx => View::Full(1),
            Edx => View::Full(2),
            Ebx => View::Full(3),
            Esp => View::Full(4),
            Ebp => View::Full(5),
            Esi => View::Full(6),
            Edi => View::Full(7),
            Eip => View::Full(8),

            Ax => View::Low16(0),
            Cx => View::Low16(1),
            Dx => View::Low16(2),
            Bx => View::Low16(3),
            Sp => View::Low16(4),
            Bp => View::Low16(5),
            Si => View::Low16(6),
            Di => View::Low16(7),
            Ip => View::Low16(8),

            Al => View::Low8(0),
            Cl => View::Low8(1),
            Dl => View::Low8(2),
            Bl => View::Low8(3),
            Ah => View::High8(0),
            Ch => View::High8(1),
            Dh => View::High8(2),
            Bh => View::High8(3),

            Es => View::Segment(0),
            Cs => View::Segment(1),
            Ss => View::Segment(2),
            Ds => View::Segment(3),
            Fs => View::Segment(4),
            Gs => View::Segment(5),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed register storage with sub-width aliasing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterFile {
    slots: [u32; 9],
    segments: [u16; 6],
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero everything, then apply the reset image (EIP=0, ESP=0xFFFF).
    pub fn reset(&mut self) {
        *self = Self::default();
        self.set(Register::Eip, 0);
        self.set(Register::Esp, 0xFFFF);
    }

    /// Read a register view (mask and shift out the requested width).
    #[inline]
    pub fn get(&self, reg: Register) -> u32 {
        match reg.view() {
            View::Full(i) => self.slots[i],
            View::Low16(i) => self.slots[i] & 0xFFFF,
            View::Low8(i) => self.slots[i] & 0xFF,
            View::High8(i) => (self.slots[i] >> 8) & 0xFF,
            View::Segment(i) => self.segments[i] as u32,
        }
    }

    /// Write a register view (mask and merge into the owning slot).
    #[inline]
    pub fn set(&mut self, reg: Register, value: u32) {
        match reg.view() {
            View::Full(i) => self.slots[i] = value,
            View::Low16(i) => self.slots[i] = (self.slots[i] & 0xFFFF_0000) | (value & 0xFFFF),
            View::Low8(i) => self.slots[i] = (self.slots[i] & 0xFFFF_FF00) | (value & 0xFF),
            View::High8(i) => {
                self.slots[i] = (self.slots[i] & 0xFFFF_00FF) | ((value & 0xFF) << 8)
            }
            View::Segment(i) => self.segments[i] = value as u16,
        }
    }

    /// Add `delta` to a register (wrapping at the view width) and return the
    /// new value.
    #[inline]
    pub fn increment(&mut self, reg: Register, delta: u32) -> u32 {
        let v = self.get(reg).wrapping_add(delta);
        self.set(reg, v);
        self.get(reg)
    }

    /// Subtract `delta` from a register (wrapping at the view width) and
    /// return the new value.
    #[inline]
    pub fn decrement(&mut self, reg: Register, delta: u32) -> u32 {
        let v = self.get(reg).wrapping_sub(delta);
        self.set(reg, v);
        self.get(reg)
    }
}

impl fmt::Display for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: [&[Register]; 2] = [&REG32, &[Register::Eip]];
        for row in rows {
            for (n, r) in row.iter().enumerate() {
                if n > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}={:08X}", r, self.get(*r))?;
            }
            writeln!(f)?;
        }
        let segs = [
            Register::Cs,
            Register::Ds,
            Register::Es,
            Register::Fs,
            Register::Gs,
            Register::Ss,
        ];
        for (n, r) in segs.iter().enumerate() {
            if n > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={:04X}", r, self.get(*r))?;
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------
// Flags
// -------------------------------------------------------------------------

/// Named EFLAGS positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    Cf,
    Pf,
    Af,
    Zf,
    Sf,
    Tf,
    If,
    Df,
    Of,
    /// Low bit of the two-bit I/O privilege level (bits 12-13).
    Iopl,
    Nt,
    Rf,
    Vm,
}

/// Reserved EFLAGS bit that reads as 1 after reset.
pub const EFLAGS_FIXED_ONE: u8 = 1;
/// Reserved EFLAGS bit that reads as 0 after reset.
pub const EFLAGS_FIXED_ZERO: u8 = 15;

impl Flag {
    pub const ALL: [Flag; 13] = [
        Flag::Cf,
        Flag::Pf,
        Flag::Af,
        Flag::Zf,
        Flag::Sf,
        Flag::Tf,
        Flag::If,
        Flag::Df,
        Flag::Of,
        Flag::Iopl,
        Flag::Nt,
        Flag::Rf,
        Flag::Vm,
    ];

    /// Architectural bit position.
    #[inline]
    pub const fn bit(self) -> u8 {
        match self {
            Flag::Cf => 0,
            Flag::Pf => 2,
            Flag::Af => 4,
            Flag::Zf => 6,
            Flag::Sf => 7,
            Flag::Tf => 8,
            Flag::If => 9,
            Flag::Df => 10,
            Flag::Of => 11,
            Flag::Iopl => 12,
            Flag::Nt => 14,
            Flag::Rf => 16,
            Flag::Vm => 17,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Flag::Cf => "CF",
            Flag::Pf => "PF",
            Flag::Af => "AF",
            Flag::Zf => "ZF",
            Flag::Sf => "SF",
            Flag::Tf => "TF",
            Flag::If => "IF",
            Flag::Df => "DF",
            Flag::Of => "OF",
            Flag::Iopl => "IOPL",
            Flag::Nt => "NT",
            Flag::Rf => "RF",
            Flag::Vm => "VM",
        }
    }
}

/// Single-bit flag storage indexed by EFLAGS bit position.
///
/// Positions 0..=31 are addressable; reads beyond that return false and
/// writes are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagStore {
    bits: u32,
}

impl FlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all flags, then force the reserved reset bits.
    pub fn reset(&mut self) {
        self.bits = 0;
        self.set_bit(EFLAGS_FIXED_ONE, true);
        self.set_bit(EFLAGS_FIXED_ZERO, false);
    }

    #[inline]
    pub fn get(&self, flag: Flag) -> bool {
        self.get_bit(flag.bit())
    }

    #[inline]
    pub fn set(&mut self, flag: Flag, on: bool) {
        self.set_bit(flag.bit(), on);
    }

    #[inline]
    pub fn get_bit(&self, index: u8) -> bool {
        match 1u32.checked_shl(index as u32) {
            Some(mask) => self.bits & mask != 0,
            None => false,
        }
    }

    #[inline]
    pub fn set_bit(&mut self, index: u8, on: bool) {
        if let Some(mask) = 1u32.checked_shl(index as u32) {
            if on {
                self.bits |= mask;
            } else {
                self.bits &= !mask;
            }
        }
    }

    /// Packed EFLAGS image.
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }
}

impl fmt::Display for FlagStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, flag) in Flag::ALL.iter().enumerate() {
            if n > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", flag.name(), self.get(*flag) as u8)?;
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------
// CpuState
// -------------------------------------------------------------------------

/// Pure architectural register / flag container.
///
/// Cheap to copy: the dispatcher snapshots it at the start of each cycle so
/// a failed memory access can roll the cycle back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuState {
    pub regs: RegisterFile,
    pub flags: FlagStore,
    pub halted: bool,
}

impl CpuState {
    /// Create a zeroed state. Call `reset` before executing anything.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the power-on register and flag image and clear the halted latch.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.flags.reset();
        self.halted = false;
    }

    #[inline]
    pub fn eip(&self) -> u32 {
        self.regs.get(Register::Eip)
    }

    #[inline]
    pub fn set_eip(&mut self, v: u32) {
        self.regs.set(Register::Eip, v);
    }
}

impl fmt::Display for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.regs)?;
        write!(f, "{} (EFLAGS={:08X})", self.flags, self.flags.bits())?;
        if self.halted {
            f.write_str(" HALTED")?;
        }
        Ok(())
    }
}
