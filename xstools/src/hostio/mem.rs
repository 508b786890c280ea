//! Registers and block RAMs
use super::{
    Error,
    Result,
};
use crate::{
    core::{
        MemWidths,
        ModuleId,
        UsbId,
    },
    device::{
        Board,
        MemoryDevice,
    },
};
use tracing::debug;

/// A word-addressable memory in the FPGA, either a single register or a block RAM
#[derive(Debug)]
pub struct Mem<D> {
    device: D,
    widths: MemWidths,
}

impl<D> Mem<D>
where
    D: MemoryDevice,
{
    /// Open the memory module `module` on the board at USB index `usb`
    /// # Errors
    /// Returns [`crate::device::Error::DeviceUnavailable`] (wrapped) if the module can't be
    /// opened
    pub fn open<B>(board: &B, usb: UsbId, module: ModuleId) -> Result<Self>
    where
        B: Board<Memory = D>,
    {
        let mem = Self::new(board.open_memory(usb, module)?);
        debug!(
            usb,
            module,
            addr_width = mem.widths.addr_width,
            data_width = mem.widths.data_width,
            "Opened memory"
        );
        Ok(mem)
    }

    /// Wrap an already opened memory device
    #[must_use]
    pub fn new(device: D) -> Self {
        let widths = device.widths();
        Self { device, widths }
    }

    #[must_use]
    pub fn addr_width(&self) -> u32 {
        self.widths.addr_width
    }

    #[must_use]
    pub fn data_width(&self) -> u32 {
        self.widths.data_width
    }

    /// Number of words in the memory
    #[must_use]
    pub fn size(&self) -> usize {
        self.widths.size()
    }

    /// Largest value a single word can hold
    #[must_use]
    pub fn max_value(&self) -> u64 {
        self.widths.max_value()
    }

    /// The underlying device
    #[must_use]
    pub fn device(&self) -> &D {
        &self.device
    }

    fn check(&self, addr: usize, count: usize) -> Result<()> {
        if count == 0 {
            return Err(Error::EmptyTransfer);
        }
        let size = self.size();
        match addr.checked_add(count) {
            Some(end) if end <= size => Ok(()),
            _ => Err(Error::OutOfBounds { addr, count, size }),
        }
    }

    /// Read the single word at `addr`
    /// # Errors
    /// Returns an error if `addr` is out of bounds or on device errors
    pub fn read(&mut self, addr: usize) -> Result<u64> {
        let mut word = [0u64];
        self.read_into(addr, &mut word)?;
        Ok(word[0])
    }

    /// Fill `words` from consecutive addresses starting at `addr`, in one transfer
    /// # Errors
    /// Returns an error if `words` is empty, runs past the end of the memory, or on device errors
    pub fn read_into(&mut self, addr: usize, words: &mut [u64]) -> Result<()> {
        self.check(addr, words.len())?;
        self.device.read_words(addr, words)?;
        Ok(())
    }

    /// Read `count` consecutive words starting at `addr`, in one transfer
    /// # Errors
    /// Returns an error if `count` is zero, runs past the end of the memory, or on device errors
    pub fn read_n(&mut self, addr: usize, count: usize) -> Result<Vec<u64>> {
        let mut words = vec![0u64; count];
        self.read_into(addr, &mut words)?;
        Ok(words)
    }

    /// Write a single word to `addr`
    /// # Errors
    /// Returns an error if `addr` is out of bounds or on device errors
    pub fn write(&mut self, addr: usize, value: u64) -> Result<()> {
        self.write_all(addr, &[value])
    }

    /// Write `words` to consecutive addresses starting at `addr`, in one transfer. The driver
    /// reports nothing back, so success means the call returned.
    /// # Errors
    /// Returns an error if `words` is empty, runs past the end of the memory, or on device errors
    pub fn write_all(&mut self, addr: usize, words: &[u64]) -> Result<()> {
        self.check(addr, words.len())?;
        self.device.write_words(addr, words)?;
        Ok(())
    }
}
