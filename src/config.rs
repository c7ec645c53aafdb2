/*!
config.rs - CPU configuration / capability set.

A `CpuConfig` describes the processor being emulated: how much memory it
owns and which operand/address widths are in effect when no legacy prefix
overrides them. Differences between CPU generations are expressed here as
data rather than as separate CPU types.

Presets:
- `CpuConfig::i386_real_mode()` (the default): 16-bit operands and 16-bit
  addressing, matching a processor fresh out of reset.
- `CpuConfig::i386_protected_flat()`: 32-bit operands and addressing over the
  same flat memory (no descriptor tables are modelled).
*/

use crate::memory::DEFAULT_MEMORY_SIZE;

/// Width of a single operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandSize {
    Byte,
    Word,
    Dword,
}

impl OperandSize {
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            OperandSize::Byte => 8,
            OperandSize::Word => 16,
            OperandSize::Dword => 32,
        }
    }

    #[inline]
    pub const fn bytes(self) -> u32 {
        self.bits() / 8
    }

    /// All-ones mask covering the operand width.
    #[inline]
    pub const fn mask(self) -> u32 {
        match self {
            OperandSize::Byte => 0xFF,
            OperandSize::Word => 0xFFFF,
            OperandSize::Dword => 0xFFFF_FFFF,
        }
    }

    /// Bit position of the sign bit.
    #[inline]
    pub const fn sign_shift(self) -> u32 {
        self.bits() - 1
    }
}

/// Effective-address computation mode (selected by default + 0x67 prefix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressSize {
    Addr16,
    Addr32,
}

impl AddressSize {
    /// The mode selected when the address-size override prefix is present.
    #[inline]
    pub const fn toggled(self) -> Self {
        match self {
            AddressSize::Addr16 => AddressSize::Addr32,
            AddressSize::Addr32 => AddressSize::Addr16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuConfig {
    /// Bytes of flat memory owned by the CPU.
    pub memory_size: usize,
    /// Width of the 16/32-bit instruction forms without an operand-size prefix.
    /// Must be `Word` or `Dword`.
    pub default_operand_size: OperandSize,
    /// Addressing mode without an address-size prefix.
    pub default_address_size: AddressSize,
    /// Reserved for 64-bit support; forces 32-bit operands when set.
    pub long_mode: bool,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self::i386_real_mode()
    }
}

impl CpuConfig {
    pub const fn i386_real_mode() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            default_operand_size: OperandSize::Word,
            default_address_size: AddressSize::Addr16,
            long_mode: false,
        }
    }

    pub const fn i386_protected_flat() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            default_operand_size: OperandSize::Dword,
            default_address_size: AddressSize::Addr32,
            long_mode: false,
        }
    }

    /// Builder-style override of the memory size.
    pub const fn with_memory_size(mut self, memory_size: usize) -> Self {
        self.memory_size = memory_size;
        self
    }

    /// Operand width for a 16/32-bit instruction form.
    ///
    /// The operand-size override toggles the default width; long mode pins it
    /// to 32 bits.
    pub fn operand_size(&self, operand_override: bool) -> OperandSize {
        if self.long_mode {
            return OperandSize::Dword;
        }
        match (self.default_operand_size, operand_override) {
            (OperandSize::Dword, false) => OperandSize::Dword,
            (OperandSize::Dword, true) => OperandSize::Word,
            (_, false) => OperandSize::Word,
            (_, true) => OperandSize::Dword,
        }
    }

    pub fn address_size(&self, address_override: bool) -> AddressSize {
        if address_override {
            self.default_address_size.toggled()
        } else {
            self.default_address_size
        }
    }
}
