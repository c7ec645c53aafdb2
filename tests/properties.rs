use proptest::prelude::*;
use x86emu::cpu::execute::overflow_heuristic;
use x86emu::cpu::state::RegisterFile;
use x86emu::{Cpu, CpuConfig, Flag, Register};

const GENERAL: [(Register, Register, Register, Register, Register); 4] = [
    (Register::Eax, Register::Ax, Register::Al, Register::Ah, Register::Ecx),
    (Register::Ecx, Register::Cx, Register::Cl, Register::Ch, Register::Edx),
    (Register::Edx, Register::Dx, Register::Dl, Register::Dh, Register::Ebx),
    (Register::Ebx, Register::Bx, Register::Bl, Register::Bh, Register::Eax),
];

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 1024,
        .. ProptestConfig::default()
    })]

    #[test]
    fn sub_width_writes_only_touch_their_bits(
        idx in 0usize..4,
        initial in any::<u32>(),
        neighbour in any::<u32>(),
        v in any::<u32>(),
        which in 0u8..3,
    ) {
        let (full, x16, lo8, hi8, other) = GENERAL[idx];
        let mut r = RegisterFile::new();
        r.set(full, initial);
        r.set(other, neighbour);

        let (view, mask) = match which {
            0 => (x16, 0x0000_FFFFu32),
            1 => (lo8, 0x0000_00FF),
            _ => (hi8, 0x0000_FF00),
        };
        r.set(view, v);

        let shift = mask.trailing_zeros();
        prop_assert_eq!(r.get(full) & !mask, initial & !mask);
        prop_assert_eq!((r.get(full) & mask) >> shift, v & (mask >> shift));
        prop_assert_eq!(r.get(view), v & (mask >> shift));
        prop_assert_eq!(r.get(other), neighbour);
    }

    #[test]
    fn full_write_is_visible_through_every_view(idx in 0usize..4, v in any::<u32>()) {
        let (full, x16, lo8, hi8, _) = GENERAL[idx];
        let mut r = RegisterFile::new();
        r.set(full, v);
        prop_assert_eq!(r.get(x16), v & 0xFFFF);
        prop_assert_eq!(r.get(lo8), v & 0xFF);
        prop_assert_eq!(r.get(hi8), (v >> 8) & 0xFF);
    }

    #[test]
    fn add32_matches_wrapping_arithmetic(a in any::<u32>(), b in any::<u32>()) {
        // ADD EAX, ECX in the flat preset.
        let mut cpu = Cpu::new(CpuConfig::i386_protected_flat().with_memory_size(0x100));
        cpu.load_image(&[0x01, 0xC8]).unwrap();
        cpu.set_reg(Register::Eax, a);
        cpu.set_reg(Register::Ecx, b);
        cpu.cycle().unwrap();

        let r = a.wrapping_add(b);
        let sf = r >> 31 != 0;
        let (cf, of) = overflow_heuristic(r < a, sf);
        prop_assert_eq!(cpu.reg(Register::Eax), r);
        prop_assert_eq!(cpu.flag(Flag::Zf), r == 0);
        prop_assert_eq!(cpu.flag(Flag::Sf), sf);
        prop_assert_eq!(cpu.flag(Flag::Cf), cf);
        prop_assert_eq!(cpu.flag(Flag::Of), of);
        prop_assert_eq!(cpu.flag(Flag::Pf), (r as u8).count_ones() % 2 == 0);
        prop_assert_eq!(cpu.flag(Flag::Af), (a & 0xF) + (b & 0xF) > 15);
        prop_assert_eq!(cpu.eip(), 2);
    }

    #[test]
    fn or8_never_sets_carry_or_overflow(a in any::<u8>(), b in any::<u8>(), cf in any::<bool>()) {
        // OR AL, imm8
        let mut cpu = Cpu::new(CpuConfig::default().with_memory_size(0x100));
        cpu.load_image(&[0x0C, b]).unwrap();
        cpu.set_reg(Register::Al, a as u32);
        cpu.set_flag(Flag::Cf, cf);
        cpu.set_flag(Flag::Of, true);
        cpu.cycle().unwrap();
        prop_assert_eq!(cpu.reg(Register::Al), (a | b) as u32);
        prop_assert!(!cpu.flag(Flag::Cf));
        prop_assert!(!cpu.flag(Flag::Of));
    }

    #[test]
    fn failed_cycles_never_change_registers(addr in 0x100u16..=0xFFFE, al in any::<u8>()) {
        // ADD [disp16], AL against 0x100 bytes of memory.
        let mut cpu = Cpu::new(CpuConfig::default().with_memory_size(0x100));
        cpu.load_image(&[0x00, 0x06, addr as u8, (addr >> 8) as u8]).unwrap();
        cpu.set_reg(Register::Al, al as u32);
        let before = *cpu.state();
        prop_assert!(cpu.cycle().is_err());
        prop_assert_eq!(*cpu.state(), before);
    }
}
