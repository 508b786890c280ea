//! A simulated board, useful for testing and for running test programs without hardware
//!
//! Modules are registered by id. Memories behave like block RAM: words are masked to the data
//! width and addresses wrap around the end of the region. DUTs are backed by a [`Circuit`] that
//! is clocked on every write and sampled on every read.

use super::{
    Board,
    DeviceResult,
    DutDevice,
    Error,
    Kind,
    MemoryDevice,
};
use crate::core::{
    mask,
    Bits,
    DutWidths,
    MemWidths,
    ModuleId,
    UsbId,
};
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
    },
};

/// The behavior behind a simulated DUT
pub trait Circuit: Debug + Send {
    fn widths(&self) -> DutWidths;

    /// Apply `inputs` and advance by one clock edge. `inputs` always has `num_inputs` lines.
    fn clock(&mut self, inputs: &[u8]);

    /// The current outputs, `num_outputs` lines. Must not change any state.
    fn outputs(&self) -> Bits;
}

fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
enum Module {
    Memory {
        widths: MemWidths,
        words: Arc<Mutex<Vec<u64>>>,
    },
    Circuit(Arc<Mutex<Box<dyn Circuit>>>),
}

/// A simulated board at a single USB index
#[derive(Debug, Clone)]
pub struct Mock {
    usb: UsbId,
    modules: HashMap<ModuleId, Module>,
}

/// Module ids of the `hostio_test` design, as loaded by [`Mock::hostio_test`]
pub mod hostio_ids {
    use crate::core::ModuleId;
    pub const REGISTER: ModuleId = 1;
    pub const BRAM: ModuleId = 2;
    pub const COUNTER: ModuleId = 3;
    pub const SUBTRACTOR: ModuleId = 4;
}

impl Mock {
    /// An empty board at USB index `usb`
    #[must_use]
    pub fn new(usb: UsbId) -> Self {
        Self {
            usb,
            modules: HashMap::new(),
        }
    }

    /// The `hostio_test` design: a 32-bit register, a 1024 x 16 block RAM, a four-bit up/down
    /// counter and an eight-bit subtractor
    #[must_use]
    pub fn hostio_test(usb: UsbId) -> Self {
        Self::new(usb)
            .with_memory(hostio_ids::REGISTER, 0, 32)
            .with_memory(hostio_ids::BRAM, 10, 16)
            .with_circuit(hostio_ids::COUNTER, Counter::new(4))
            .with_circuit(hostio_ids::SUBTRACTOR, Subtractor::new(8))
    }

    /// Add a zeroed memory of `2^addr_width` words of `data_width` bits
    #[must_use]
    pub fn with_memory(mut self, module: ModuleId, addr_width: u32, data_width: u32) -> Self {
        let widths = MemWidths {
            addr_width,
            data_width,
        };
        self.modules.insert(
            module,
            Module::Memory {
                widths,
                words: Arc::new(Mutex::new(vec![0; widths.size()])),
            },
        );
        self
    }

    /// Add a DUT backed by `circuit`
    #[must_use]
    pub fn with_circuit<C>(mut self, module: ModuleId, circuit: C) -> Self
    where
        C: Circuit + 'static,
    {
        let circuit: Box<dyn Circuit> = Box::new(circuit);
        self.modules
            .insert(module, Module::Circuit(Arc::new(Mutex::new(circuit))));
        self
    }

    fn module(&self, kind: Kind, usb: UsbId, module: ModuleId) -> DeviceResult<&Module> {
        let unavailable = Error::DeviceUnavailable { kind, usb, module };
        if usb != self.usb {
            return Err(unavailable);
        }
        self.modules.get(&module).ok_or(unavailable)
    }
}

impl Board for Mock {
    type Memory = MockMemory;
    type Dut = MockDut;

    fn open_memory(&self, usb: UsbId, module: ModuleId) -> DeviceResult<MockMemory> {
        match self.module(Kind::Memory, usb, module)? {
            Module::Memory { widths, words } => Ok(MockMemory {
                widths: *widths,
                words: Arc::clone(words),
                writes: 0,
                reads: 0,
            }),
            Module::Circuit(_) => Err(Error::DeviceUnavailable {
                kind: Kind::Memory,
                usb,
                module,
            }),
        }
    }

    fn open_dut(&self, usb: UsbId, module: ModuleId) -> DeviceResult<MockDut> {
        match self.module(Kind::Dut, usb, module)? {
            Module::Circuit(circuit) => Ok(MockDut {
                widths: lock(circuit).widths(),
                circuit: Arc::clone(circuit),
                writes: 0,
                reads: 0,
            }),
            Module::Memory { .. } => Err(Error::DeviceUnavailable {
                kind: Kind::Dut,
                usb,
                module,
            }),
        }
    }
}

/// A session on a simulated memory. Sessions on the same module share its contents.
#[derive(Debug)]
pub struct MockMemory {
    widths: MemWidths,
    words: Arc<Mutex<Vec<u64>>>,
    writes: usize,
    reads: usize,
}

impl MockMemory {
    /// Number of driver write calls made through this session
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Number of driver read calls made through this session
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl MemoryDevice for MockMemory {
    fn widths(&self) -> MemWidths {
        self.widths
    }

    fn write_words(&mut self, addr: usize, words: &[u64]) -> DeviceResult<()> {
        self.writes += 1;
        let mask = mask(self.widths.data_width);
        let mut mem = lock(&self.words);
        let size = mem.len();
        for (i, word) in words.iter().enumerate() {
            mem[(addr + i) % size] = word & mask;
        }
        Ok(())
    }

    fn read_words(&mut self, addr: usize, words: &mut [u64]) -> DeviceResult<()> {
        self.reads += 1;
        let mem = lock(&self.words);
        let size = mem.len();
        for (i, word) in words.iter_mut().enumerate() {
            *word = mem[(addr + i) % size];
        }
        Ok(())
    }
}

/// A session on a simulated DUT. Sessions on the same module share its circuit.
#[derive(Debug)]
pub struct MockDut {
    widths: DutWidths,
    circuit: Arc<Mutex<Box<dyn Circuit>>>,
    writes: usize,
    reads: usize,
}

impl MockDut {
    /// Number of driver write calls made through this session
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Number of driver read calls made through this session
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl DutDevice for MockDut {
    fn widths(&self) -> DutWidths {
        self.widths
    }

    fn write_lines(&mut self, lines: &[u8]) -> DeviceResult<()> {
        self.writes += 1;
        // The driver sends what it's given, missing lines float low
        let mut inputs = vec![0u8; self.widths.num_inputs];
        let n = inputs.len().min(lines.len());
        inputs[..n].copy_from_slice(&lines[..n]);
        lock(&self.circuit).clock(&inputs);
        Ok(())
    }

    fn read_lines(&mut self, lines: &mut [u8]) -> DeviceResult<()> {
        self.reads += 1;
        let outputs = lock(&self.circuit).outputs();
        let n = outputs.len().min(lines.len());
        lines[..n].copy_from_slice(&outputs.lines()[..n]);
        Ok(())
    }
}

/// An up/down counter. Input line 0 high counts up, low counts down, one step per write.
#[derive(Debug, Clone)]
pub struct Counter {
    width: usize,
    count: u64,
}

impl Counter {
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self { width, count: 0 }
    }
}

impl Circuit for Counter {
    fn widths(&self) -> DutWidths {
        DutWidths {
            num_inputs: 1,
            num_outputs: self.width,
        }
    }

    fn clock(&mut self, inputs: &[u8]) {
        let mask = mask(u32::try_from(self.width).unwrap_or(u32::MAX));
        let next = if inputs[0] == 0 {
            self.count.wrapping_sub(1)
        } else {
            self.count.wrapping_add(1)
        };
        self.count = next & mask;
    }

    fn outputs(&self) -> Bits {
        Bits::from_value(self.count, self.width)
    }
}

/// A combinational subtractor. Inputs are the minuend (lines `0..width`) then the subtrahend;
/// outputs are the difference (lines `0..width`) then a borrow line.
#[derive(Debug, Clone)]
pub struct Subtractor {
    width: usize,
    minuend: u64,
    subtrahend: u64,
}

impl Subtractor {
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            width,
            minuend: 0,
            subtrahend: 0,
        }
    }
}

impl Circuit for Subtractor {
    fn widths(&self) -> DutWidths {
        DutWidths {
            num_inputs: 2 * self.width,
            num_outputs: self.width + 1,
        }
    }

    fn clock(&mut self, inputs: &[u8]) {
        let (a, b) = inputs.split_at(self.width);
        self.minuend = Bits::from_lines(a.to_vec()).value();
        self.subtrahend = Bits::from_lines(b.to_vec()).value();
    }

    fn outputs(&self) -> Bits {
        let diff = Bits::from_value(self.minuend.wrapping_sub(self.subtrahend), self.width);
        let borrow = Bits::from_value(u64::from(self.minuend < self.subtrahend), 1);
        Bits::concat(&[diff, borrow])
    }
}

/// Outputs whatever was last written to the inputs
#[derive(Debug, Clone)]
pub struct Loopback {
    latched: Bits,
}

impl Loopback {
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            latched: Bits::from_value(0, width),
        }
    }
}

impl Circuit for Loopback {
    fn widths(&self) -> DutWidths {
        DutWidths {
            num_inputs: self.latched.len(),
            num_outputs: self.latched.len(),
        }
    }

    fn clock(&mut self, inputs: &[u8]) {
        self.latched = Bits::from_lines(inputs.to_vec());
    }

    fn outputs(&self) -> Bits {
        self.latched.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paste::paste;

    macro_rules! test_word_width {
        ($width:literal, $v:literal) => {
            paste! {
                #[test]
                fn [<test_rw_width_ $width>]() {
                    let board = Mock::new(0).with_memory(1, 4, $width);
                    let mut mem = board.open_memory(0, 1).unwrap();
                    let word: u64 = $v;
                    mem.write_words(3, &[word]).unwrap();
                    let mut read = [0u64];
                    mem.read_words(3, &mut read).unwrap();
                    assert_eq!(read[0], word & mask($width));
                }
            }
        };
    }

    #[test]
    fn test_unknown_module() {
        let board = Mock::hostio_test(0);
        assert!(matches!(
            board.open_memory(0, 42),
            Err(Error::DeviceUnavailable {
                kind: Kind::Memory,
                usb: 0,
                module: 42
            })
        ));
    }

    #[test]
    fn test_wrong_usb() {
        let board = Mock::hostio_test(0);
        assert!(matches!(
            board.open_dut(1, hostio_ids::COUNTER),
            Err(Error::DeviceUnavailable { usb: 1, .. })
        ));
    }

    #[test]
    fn test_wrong_kind() {
        let board = Mock::hostio_test(0);
        assert!(board.open_dut(0, hostio_ids::BRAM).is_err());
        assert!(board.open_memory(0, hostio_ids::COUNTER).is_err());
    }

    #[test]
    fn test_hostio_widths() {
        let board = Mock::hostio_test(0);
        let reg = board.open_memory(0, hostio_ids::REGISTER).unwrap();
        assert_eq!(reg.widths().size(), 1);
        let bram = board.open_memory(0, hostio_ids::BRAM).unwrap();
        assert_eq!(bram.widths().size(), 1024);
        let sub = board.open_dut(0, hostio_ids::SUBTRACTOR).unwrap();
        assert_eq!(
            sub.widths(),
            DutWidths {
                num_inputs: 16,
                num_outputs: 9
            }
        );
    }

    #[test]
    fn test_sessions_share_contents() {
        let board = Mock::new(0).with_memory(2, 2, 8);
        let mut a = board.open_memory(0, 2).unwrap();
        let mut b = board.open_memory(0, 2).unwrap();
        a.write_words(0, &[1, 2, 3, 4]).unwrap();
        let mut read = [0u64; 4];
        b.read_words(0, &mut read).unwrap();
        assert_eq!(read, [1, 2, 3, 4]);
        assert_eq!(a.writes(), 1);
        assert_eq!(b.reads(), 1);
    }

    #[test]
    fn test_address_wraps() {
        let board = Mock::new(0).with_memory(2, 2, 8);
        let mut mem = board.open_memory(0, 2).unwrap();
        mem.write_words(3, &[7, 8]).unwrap();
        let mut read = [0u64; 4];
        mem.read_words(0, &mut read).unwrap();
        assert_eq!(read, [8, 0, 0, 7]);
    }

    #[test]
    fn test_counter_wraps_both_ways() {
        let mut c = Counter::new(4);
        c.clock(&[0]);
        assert_eq!(c.outputs().value(), 15);
        c.clock(&[1]);
        c.clock(&[1]);
        assert_eq!(c.outputs().value(), 1);
    }

    #[test]
    fn test_subtractor_borrow() {
        let mut s = Subtractor::new(8);
        let inputs = Bits::concat(&[Bits::from_value(5, 8), Bits::from_value(7, 8)]);
        s.clock(inputs.lines());
        let out = s.outputs().split(&[8, 1]).unwrap();
        assert_eq!(out[0].value(), 254);
        assert_eq!(out[1].value(), 1);
    }

    #[test]
    fn test_read_does_not_clock() {
        let board = Mock::new(0).with_circuit(3, Counter::new(4));
        let mut dut = board.open_dut(0, 3).unwrap();
        dut.write_lines(&[1]).unwrap();
        let mut a = [0u8; 4];
        let mut b = [0u8; 4];
        dut.read_lines(&mut a).unwrap();
        dut.read_lines(&mut b).unwrap();
        assert_eq!(a, [1, 0, 0, 0]);
        assert_eq!(a, b);
        assert_eq!(dut.writes(), 1);
        assert_eq!(dut.reads(), 2);
    }

    test_word_width!(1, 0x3);
    test_word_width!(8, 0x1C8);
    test_word_width!(16, 0xDEAD);
    test_word_width!(32, 0xDEAD_BEEF);
    test_word_width!(64, 0xDEAD_BEEF_B0BA_CAFE);
}
