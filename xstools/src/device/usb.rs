//! Boards attached over USB, driven through the vendor's XSTOOLs API library
use super::{
    Board,
    DeviceResult,
    DutDevice,
    MemoryDevice,
};
use crate::core::{
    DutWidths,
    MemWidths,
    ModuleId,
    UsbId,
};
use std::{
    path::Path,
    sync::Arc,
};
use tracing::debug;
use xsapi::{
    Api,
    Handle,
};

/// Every board reachable through one loaded copy of the vendor library
#[derive(Debug, Clone)]
pub struct XsUsb {
    api: Arc<Api>,
}

impl XsUsb {
    /// Load the vendor library from `path`
    /// # Errors
    /// Returns an error if the library can't be loaded
    pub fn load(path: impl AsRef<Path>) -> DeviceResult<Self> {
        Ok(Self {
            api: Arc::new(Api::load(path)?),
        })
    }

    /// Load the vendor library from the location in `XSTOOLS_API`, or the default name
    /// # Errors
    /// Returns an error if the library can't be loaded
    pub fn from_env() -> DeviceResult<Self> {
        Ok(Self {
            api: Arc::new(Api::from_env()?),
        })
    }
}

impl Board for XsUsb {
    type Memory = UsbMemory;
    type Dut = UsbDut;

    fn open_memory(&self, usb: UsbId, module: ModuleId) -> DeviceResult<UsbMemory> {
        let opened = self.api.mem_init(usb, module)?;
        Ok(UsbMemory {
            api: Arc::clone(&self.api),
            handle: opened.handle,
            widths: MemWidths {
                addr_width: opened.first,
                data_width: opened.second,
            },
        })
    }

    fn open_dut(&self, usb: UsbId, module: ModuleId) -> DeviceResult<UsbDut> {
        let opened = self.api.dut_init(usb, module)?;
        Ok(UsbDut {
            api: Arc::clone(&self.api),
            handle: opened.handle,
            widths: DutWidths {
                num_inputs: opened.first as usize,
                num_outputs: opened.second as usize,
            },
        })
    }
}

/// A memory session. Keeps the library loaded for as long as the handle lives.
#[derive(Debug)]
pub struct UsbMemory {
    api: Arc<Api>,
    handle: Handle,
    widths: MemWidths,
}

impl MemoryDevice for UsbMemory {
    fn widths(&self) -> MemWidths {
        self.widths
    }

    fn write_words(&mut self, addr: usize, words: &[u64]) -> DeviceResult<()> {
        Ok(self.api.mem_write(self.handle, addr, words)?)
    }

    fn read_words(&mut self, addr: usize, words: &mut [u64]) -> DeviceResult<()> {
        Ok(self.api.mem_read(self.handle, addr, words)?)
    }
}

impl Drop for UsbMemory {
    fn drop(&mut self) {
        debug!(handle = ?self.handle, "Releasing memory session");
    }
}

/// A DUT session. Keeps the library loaded for as long as the handle lives.
#[derive(Debug)]
pub struct UsbDut {
    api: Arc<Api>,
    handle: Handle,
    widths: DutWidths,
}

impl DutDevice for UsbDut {
    fn widths(&self) -> DutWidths {
        self.widths
    }

    fn write_lines(&mut self, lines: &[u8]) -> DeviceResult<()> {
        Ok(self.api.dut_write(self.handle, lines)?)
    }

    fn read_lines(&mut self, lines: &mut [u8]) -> DeviceResult<()> {
        Ok(self.api.dut_read(self.handle, lines)?)
    }
}

impl Drop for UsbDut {
    fn drop(&mut self) {
        debug!(handle = ?self.handle, "Releasing DUT session");
    }
}
