//! Defines the capabilities every board implementation must provide.
//!
//! A [`Board`] opens modules by USB index and module id. What comes back is either a
//! [`MemoryDevice`] or a [`DutDevice`], each a thin view of one driver session. The methods of
//! these traits transfer exactly what they're given in a single driver call and do no
//! validation of their own; that is left to the adapters in [`crate::hostio`].

pub mod mock;
pub mod usb;

use crate::core::{
    DutWidths,
    MemWidths,
    ModuleId,
    UsbId,
};
pub use xsapi::Kind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} module {module} is not available on USB port {usb}")]
    DeviceUnavailable {
        kind: Kind,
        usb: UsbId,
        module: ModuleId,
    },
    #[error(transparent)]
    Driver(xsapi::Error),
}

impl From<xsapi::Error> for Error {
    fn from(e: xsapi::Error) -> Self {
        match e {
            xsapi::Error::NullHandle { kind, usb, module } => {
                Error::DeviceUnavailable { kind, usb, module }
            }
            e => Error::Driver(e),
        }
    }
}

pub type DeviceResult<T> = Result<T, Error>;

/// A word-addressable memory region (a single register or a block RAM)
pub trait MemoryDevice {
    /// The widths reported when the memory was opened
    fn widths(&self) -> MemWidths;

    /// Write `words` to consecutive addresses starting at `addr` in one driver call
    fn write_words(&mut self, addr: usize, words: &[u64]) -> DeviceResult<()>;

    /// Fill `words` from consecutive addresses starting at `addr` in one driver call
    fn read_words(&mut self, addr: usize, words: &mut [u64]) -> DeviceResult<()>;
}

/// A generic circuit with `num_inputs` input lines and `num_outputs` output lines.
///
/// Writing the inputs is also the clock edge of sequential circuits. Reading the outputs must
/// never advance the circuit's state.
pub trait DutDevice {
    /// The line counts reported when the DUT was opened
    fn widths(&self) -> DutWidths;

    /// Drive all input lines in one driver call
    fn write_lines(&mut self, lines: &[u8]) -> DeviceResult<()>;

    /// Sample all output lines in one driver call
    fn read_lines(&mut self, lines: &mut [u8]) -> DeviceResult<()>;
}

/// A board that hands out memory and DUT sessions
pub trait Board {
    type Memory: MemoryDevice;
    type Dut: DutDevice;

    /// Open the memory module `module` on the board at USB index `usb`
    fn open_memory(&self, usb: UsbId, module: ModuleId) -> DeviceResult<Self::Memory>;

    /// Open the DUT module `module` on the board at USB index `usb`
    fn open_dut(&self, usb: UsbId, module: ModuleId) -> DeviceResult<Self::Dut>;
}
