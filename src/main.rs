#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use x86emu::memory::DEFAULT_MEMORY_SIZE;
use x86emu::{Cpu, CpuConfig};

#[derive(Parser, Debug)]
#[command(
    name = "x86emu",
    about = "Run a flat x86 program image until HLT or a cycle limit."
)]
struct Args {
    /// Program image, loaded at address 0
    image: PathBuf,

    /// Memory size in bytes (decimal or 0x-prefixed hex)
    #[arg(long, value_name = "BYTES", value_parser = parse_number, default_value_t = DEFAULT_MEMORY_SIZE as u64)]
    memory_size: u64,

    /// Stop after this many cycles even if the CPU has not halted
    #[arg(long, value_name = "N", default_value_t = 1_000_000)]
    max_cycles: usize,

    /// Use 32-bit operand and address defaults instead of real mode
    #[arg(long, action = clap::ArgAction::SetTrue)]
    flat: bool,

    /// Print the register/flag state after every cycle
    #[arg(long, action = clap::ArgAction::SetTrue)]
    dump: bool,

    /// Print the 32-bit word at this address after every cycle
    #[arg(long, value_name = "ADDR", value_parser = parse_number)]
    watch: Option<u64>,
}

fn parse_number(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|err| format!("invalid number {s:?}: {err}"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    run(Args::parse())
}

fn run(args: Args) -> anyhow::Result<()> {
    let image = std::fs::read(&args.image)
        .with_context(|| format!("read image {}", args.image.display()))?;

    let memory_size = usize::try_from(args.memory_size).context("memory size does not fit usize")?;
    let watch = args
        .watch
        .map(u32::try_from)
        .transpose()
        .context("watch address exceeds 32 bits")?;

    let base = if args.flat {
        CpuConfig::i386_protected_flat()
    } else {
        CpuConfig::i386_real_mode()
    };
    let mut cpu = Cpu::new(base.with_memory_size(memory_size));
    cpu.load_image(&image)
        .with_context(|| format!("load image {}", args.image.display()))?;

    tracing::info!(
        image = %args.image.display(),
        len = image.len(),
        memory_size,
        "starting"
    );

    let mut cycles = 0usize;
    while cycles < args.max_cycles && !cpu.is_halted() {
        cpu.cycle()
            .with_context(|| format!("cycle {cycles} at EIP={:#x}", cpu.eip()))?;
        cycles += 1;

        if args.dump {
            println!("{}", cpu.state());
        }
        if let Some(addr) = watch {
            match cpu.memory().read_u32(addr) {
                Ok(v) => println!("[{addr:#010x}] = {v:#010x}"),
                Err(err) => bail!("watch: {err}"),
            }
        }
    }

    println!("{}", cpu.state());
    println!(
        "cycles={cycles} halted={} unimplemented={}",
        cpu.is_halted(),
        cpu.unimplemented_count()
    );
    Ok(())
}
