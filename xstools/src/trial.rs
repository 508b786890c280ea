//! Batches of write/read trials against the modules of a host I/O test design.
//!
//! Mismatches never abort a batch. They are counted and reported once at the end in a
//! [`TrialReport`].

use crate::{
    core::{
        mask,
        Bits,
    },
    device::{
        DutDevice,
        MemoryDevice,
    },
    hostio::{
        Dut,
        Mem,
        Result,
    },
};
use indicatif::ProgressBar;
use rand::Rng;
use std::fmt;
use tracing::info;

/// The outcome of a batch of trials
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TrialReport {
    pub trials: usize,
    pub errors: usize,
}

impl TrialReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.errors == 0
    }
}

impl fmt::Display for TrialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors in {} trials", self.errors, self.trials)
    }
}

/// The control input of an up/down counter
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Increment,
    Decrement,
}

impl Direction {
    #[must_use]
    pub fn control(self) -> u64 {
        match self {
            Direction::Increment => 1,
            Direction::Decrement => 0,
        }
    }
}

/// Write a random word to address 0 and read it back, `trials` times
/// # Errors
/// Returns an error on device errors
pub fn register_trials<D, R>(
    reg: &mut Mem<D>,
    trials: usize,
    rng: &mut R,
    progress: &ProgressBar,
) -> Result<TrialReport>
where
    D: MemoryDevice,
    R: Rng,
{
    let max = reg.max_value();
    let mut report = TrialReport {
        trials,
        errors: 0,
    };
    for _ in 0..trials {
        let written = rng.gen_range(0..=max);
        reg.write(0, written)?;
        if reg.read(0)? != written {
            report.errors += 1;
        }
        progress.inc(1);
    }
    progress.finish();
    info!(%report, "Register trials done");
    Ok(report)
}

/// Fill the whole memory with random words in one transfer, read it back in one transfer, and
/// count the locations that differ
/// # Errors
/// Returns an error on device errors
pub fn bram_trial<D, R>(bram: &mut Mem<D>, rng: &mut R) -> Result<TrialReport>
where
    D: MemoryDevice,
    R: Rng,
{
    let max = bram.max_value();
    let written: Vec<u64> = (0..bram.size()).map(|_| rng.gen_range(0..=max)).collect();
    bram.write_all(0, &written)?;
    let read = bram.read_n(0, written.len())?;
    let report = TrialReport {
        trials: written.len(),
        errors: written.iter().zip(&read).filter(|(w, r)| w != r).count(),
    };
    info!(%report, "Block RAM trial done");
    Ok(report)
}

/// The number of steps a counter takes to wrap around to its starting value, `2^num_outputs`.
/// Returns `None` if that doesn't fit in a `usize`.
#[must_use]
pub fn counter_period<D>(counter: &Dut<D>) -> Option<usize>
where
    D: DutDevice,
{
    let width = u32::try_from(counter.num_outputs()).ok()?;
    1usize.checked_shl(width)
}

/// Step the counter `steps` times in `direction`, sampling its outputs after each step
/// # Errors
/// Returns an error on device errors
pub fn counter_sweep<D>(
    counter: &mut Dut<D>,
    direction: Direction,
    steps: usize,
) -> Result<Vec<Bits>>
where
    D: DutDevice,
{
    (0..steps)
        .map(|_| counter.exec(direction.control()))
        .collect()
}

/// Apply random operand pairs to a subtractor with input fields `[width, width]` and output
/// fields `[width, 1]`, checking the difference (modulo `2^width`) and the borrow line
/// # Errors
/// Returns an error on device errors or if the subtractor's fields aren't laid out as above
pub fn subtractor_trials<D, R>(
    subtractor: &mut Dut<D>,
    trials: usize,
    rng: &mut R,
    progress: &ProgressBar,
) -> Result<TrialReport>
where
    D: DutDevice,
    R: Rng,
{
    let width = subtractor.input_fields().first().copied().unwrap_or(0);
    let max = mask(u32::try_from(width).unwrap_or(u32::MAX));
    let mut report = TrialReport {
        trials,
        errors: 0,
    };
    for _ in 0..trials {
        let minuend = rng.gen_range(0..=max);
        let subtrahend = rng.gen_range(0..=max);
        let out = subtractor.exec_fields(&[minuend, subtrahend])?;
        let diff = out.first().map(Bits::value);
        let borrow = out.get(1).map(Bits::value);
        if diff != Some(minuend.wrapping_sub(subtrahend) & max)
            || borrow != Some(u64::from(minuend < subtrahend))
        {
            report.errors += 1;
        }
        progress.inc(1);
    }
    progress.finish();
    info!(%report, "Subtractor trials done");
    Ok(report)
}
