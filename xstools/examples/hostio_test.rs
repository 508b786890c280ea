//! In this example, we exercise the four modules of the `hostio_test` design:
//!
//! 1. Write and read the single register with a stream of random values.
//! 2. Write and read the whole block RAM with random values.
//! 3. Increment and then decrement the four-bit counter, printing its bits after each step.
//! 4. Send random operands to the eight-bit subtractor and check its results.
//!
//! Pass `--sim` to run against a simulated board instead of real hardware.

use clap::Parser;
use indicatif::ProgressBar;
use rand::{
    rngs::StdRng,
    SeedableRng,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use xstools::{
    prelude::*,
    trial::{
        bram_trial,
        counter_period,
        counter_sweep,
        register_trials,
        subtractor_trials,
        Direction,
    },
};

#[derive(Debug, Parser)]
struct Args {
    /// USB index of the board
    #[arg(long, default_value_t = 0)]
    usb: UsbId,
    /// Module id of the single register
    #[arg(long, default_value_t = 1)]
    reg_id: ModuleId,
    /// Module id of the block RAM
    #[arg(long, default_value_t = 2)]
    bram_id: ModuleId,
    /// Module id of the four-bit counter
    #[arg(long, default_value_t = 3)]
    counter_id: ModuleId,
    /// Module id of the eight-bit subtractor
    #[arg(long, default_value_t = 4)]
    subtractor_id: ModuleId,
    /// Number of register and subtractor trials
    #[arg(long, default_value_t = 1000)]
    trials: usize,
    /// Seed for the random values, drawn from entropy if absent
    #[arg(long)]
    seed: Option<u64>,
    /// Run against a simulated board
    #[arg(long)]
    sim: bool,
    /// Path to the XSTOOLs API library, overriding `XSTOOLS_API`
    #[arg(long)]
    library: Option<PathBuf>,
}

fn banner(title: &str) {
    println!("\n{}\n# {title}\n{}", "#".repeat(66), "#".repeat(66));
}

fn run<B: Board>(board: &B, args: &Args) -> anyhow::Result<()> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let trials = args.trials as u64;

    banner("Test the single register in the FPGA hostio_test circuit.");
    let mut reg = Mem::open(board, args.usb, args.reg_id)?;
    let report = register_trials(&mut reg, args.trials, &mut rng, &ProgressBar::new(trials))?;
    println!(
        "Register was written and read back {} times and {} errors occurred.",
        report.trials, report.errors
    );

    banner("Test the block RAM in the FPGA hostio_test circuit.");
    let mut bram = Mem::open(board, args.usb, args.bram_id)?;
    let report = bram_trial(&mut bram, &mut rng)?;
    println!(
        "{} BRAM locations were written and read back and {} errors were found.",
        report.trials, report.errors
    );

    banner("Test the four-bit counter in the FPGA hostio_test circuit.");
    let mut counter = Dut::open(board, args.usb, args.counter_id)?;
    let steps = counter_period(&counter).ok_or_else(|| {
        anyhow::anyhow!(
            "A counter with {} outputs is too wide to sweep",
            counter.num_outputs()
        )
    })?;
    for (label, direction) in [
        ("First, we increment:", Direction::Increment),
        ("\nThen, we decrement:", Direction::Decrement),
    ] {
        println!("{label}");
        for cnt in counter_sweep(&mut counter, direction, steps)? {
            println!("{cnt:>4} : {:2}", cnt.value());
        }
    }

    banner("Test the eight-bit subtractor in the FPGA hostio_test circuit.");
    let mut subtractor =
        Dut::open_with_fields(board, args.usb, args.subtractor_id, &[8, 8], &[8, 1])?;
    let report = subtractor_trials(
        &mut subtractor,
        args.trials,
        &mut rng,
        &ProgressBar::new(trials),
    )?;
    println!(
        "{} errors were found in {} trials of the subtractor.",
        report.errors, report.trials
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    if args.sim {
        run(&Mock::hostio_test(args.usb), &args)
    } else {
        let board = match &args.library {
            Some(path) => XsUsb::load(path)?,
            None => XsUsb::from_env()?,
        };
        run(&board, &args)
    }
}
