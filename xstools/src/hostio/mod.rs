//! Adapters that normalize access to the two primitives of the host I/O modules: word memories
//! ([`Mem`]) and devices-under-test ([`Dut`]).

pub mod dut;
pub mod mem;

pub use dut::Dut;
pub use mem::Mem;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Device(#[from] crate::device::Error),
    #[error("Transfers must move at least one element")]
    EmptyTransfer,
    #[error("Transfer of {count} words at address {addr} runs past the end of a {size} word memory")]
    OutOfBounds {
        addr: usize,
        count: usize,
        size: usize,
    },
    #[error("Expected {expected} elements, got {got}")]
    BadSize { expected: usize, got: usize },
    #[error("Field widths add up to {fields} but the DUT has {lines} {side} lines")]
    FieldMismatch {
        side: &'static str,
        fields: usize,
        lines: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
