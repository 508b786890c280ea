//! Prelude (helpful reexports) for this package

pub use crate::{
    core::{
        Bits,
        ModuleId,
        UsbId,
    },
    device::{
        mock::Mock,
        usb::XsUsb,
        Board,
        DutDevice,
        MemoryDevice,
    },
    hostio::{
        Dut,
        Mem,
    },
};
