//! Per-cycle decode record and the legacy prefix table.
//!
//! An `Opcode` lives for exactly one `cycle()` call. The prefix scanner fills
//! in the prefixes, `begin_ip` and the opcode byte; handlers that take a
//! ModR/M byte fill in the remaining fields through `addressing::parse_modrm`.

use std::fmt;

use crate::cpu::state::{REG32, Register};

/// The eight recognized legacy prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prefix {
    CsOverride,
    SsOverride,
    DsOverride,
    EsOverride,
    FsOverride,
    GsOverride,
    OperandSize,
    AddressSize,
}

impl Prefix {
    pub const fn from_byte(byte: u8) -> Option<Prefix> {
        Some(match byte {
            0x2E => Prefix::CsOverride,
            0x36 => Prefix::SsOverride,
            0x3E => Prefix::DsOverride,
            0x26 => Prefix::EsOverride,
            0x64 => Prefix::FsOverride,
            0x65 => Prefix::GsOverride,
            0x66 => Prefix::OperandSize,
            0x67 => Prefix::AddressSize,
            _ => return None,
        })
    }

    pub const fn byte(self) -> u8 {
        match self {
            Prefix::CsOverride => 0x2E,
            Prefix::SsOverride => 0x36,
            Prefix::DsOverride => 0x3E,
            Prefix::EsOverride => 0x26,
            Prefix::FsOverride => 0x64,
            Prefix::GsOverride => 0x65,
            Prefix::OperandSize => 0x66,
            Prefix::AddressSize => 0x67,
        }
    }
}

/// Decomposed ModR/M byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModRm {
    pub raw: u8,
    /// Addressing mode, bits 7-6.
    pub mode: u8,
    /// Register field, bits 5-3.
    pub reg: u8,
    /// Register/memory selector, bits 2-0.
    pub rm: u8,
}

impl ModRm {
    #[inline]
    pub const fn from_byte(raw: u8) -> Self {
        Self {
            raw,
            mode: raw >> 6,
            reg: (raw >> 3) & 0b111,
            rm: raw & 0b111,
        }
    }

    /// `mod == 11`: the rm field names a register, not memory.
    #[inline]
    pub const fn is_register_direct(&self) -> bool {
        self.mode == 0b11
    }
}

/// Decomposed SIB byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sib {
    pub raw: u8,
    pub scale: u8,
    pub index: u8,
    pub base: u8,
}

impl Sib {
    #[inline]
    pub const fn from_byte(raw: u8) -> Self {
        Self {
            raw,
            scale: raw >> 6,
            index: (raw >> 3) & 0b111,
            base: raw & 0b111,
        }
    }

    /// Base register, or `None` when base=101 with mod=00 (a bare disp32
    /// follows instead). With mod=01/10 base=101 is EBP.
    pub fn base_register(&self, mode: u8) -> Option<Register> {
        if self.base == 0b101 && mode == 0b00 {
            None
        } else {
            Some(REG32[self.base as usize])
        }
    }

    /// Index register, or `None` for index=100.
    pub fn index_register(&self) -> Option<Register> {
        if self.index == 0b100 {
            None
        } else {
            Some(REG32[self.index as usize])
        }
    }
}

/// Transient decode record for a single instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Opcode {
    /// Legacy prefixes in encounter order.
    pub prefixes: Vec<Prefix>,
    /// EIP when decoding started (first prefix or opcode byte).
    pub begin_ip: u32,
    pub instruction: u8,
    /// Set once the handler has parsed a ModR/M byte.
    pub modrm: Option<ModRm>,
    /// Set once the address decoder has consumed a SIB byte.
    pub sib: Option<Sib>,
}

impl Opcode {
    pub fn new(begin_ip: u32) -> Self {
        Self {
            begin_ip,
            ..Self::default()
        }
    }

    #[inline]
    pub fn has_prefix(&self, prefix: Prefix) -> bool {
        self.prefixes.contains(&prefix)
    }

    /// Parsed ModR/M, or an all-zero one if the handler never asked for it.
    #[inline]
    pub fn modrm(&self) -> ModRm {
        self.modrm.unwrap_or_default()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}:", self.begin_ip)?;
        for p in &self.prefixes {
            write!(f, " {:02X}", p.byte())?;
        }
        write!(f, " {:02X}", self.instruction)?;
        if let Some(m) = self.modrm {
            write!(f, " {:02X}", m.raw)?;
        }
        if let Some(s) = self.sib {
            write!(f, " {:02X}", s.raw)?;
        }
        Ok(())
    }
}
