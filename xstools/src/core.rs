//! The core types shared by the devices and adapters

use std::fmt;

/// The USB index of a board attached to the host
pub type UsbId = u32;

/// The identifier of a module inside the FPGA design
pub type ModuleId = u32;

/// The widths of a word-addressable memory
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MemWidths {
    /// Number of address bits, the memory holds `2^addr_width` words
    pub addr_width: u32,
    /// Number of bits in each word
    pub data_width: u32,
}

impl MemWidths {
    /// The number of words in the memory
    #[must_use]
    pub fn size(&self) -> usize {
        1usize.checked_shl(self.addr_width).unwrap_or(usize::MAX)
    }

    /// The largest value a word can hold
    #[must_use]
    pub fn max_value(&self) -> u64 {
        mask(self.data_width)
    }
}

/// The line counts of a device-under-test
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DutWidths {
    pub num_inputs: usize,
    pub num_outputs: usize,
}

/// All ones in the lowest `width` bits
#[must_use]
pub fn mask(width: u32) -> u64 {
    if width >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// The total number of lines in fields of the given widths, `None` if it overflows
#[must_use]
pub fn total_width(widths: &[usize]) -> Option<usize> {
    widths.iter().try_fold(0usize, |acc, &w| acc.checked_add(w))
}

/// A vector of DUT lines. Index 0 is always the least significant bit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Bits(Vec<u8>);

impl Bits {
    /// Unpack the lowest `width` bits of `value`, bit 0 becoming line 0
    #[must_use]
    pub fn from_value(value: u64, width: usize) -> Self {
        Self(
            (0..width)
                .map(|i| {
                    let shift = u32::try_from(i).unwrap_or(u32::MAX);
                    u8::from(value.checked_shr(shift).unwrap_or(0) & 1 == 1)
                })
                .collect(),
        )
    }

    /// Wrap raw lines as read from a DUT
    #[must_use]
    pub fn from_lines(lines: Vec<u8>) -> Self {
        Self(lines)
    }

    /// The packed integer, with the highest line as the most significant bit. Vectors wider than
    /// 64 lines keep only their lowest 64 lines.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 1) | u64::from(b != 0))
    }

    #[must_use]
    pub fn lines(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_lines(self) -> Vec<u8> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split into consecutive fields of the given widths, the first field starting at line 0.
    /// Returns `None` if the widths don't add up to the length of this vector.
    #[must_use]
    pub fn split(&self, widths: &[usize]) -> Option<Vec<Bits>> {
        if total_width(widths) != Some(self.0.len()) {
            return None;
        }
        let mut start = 0;
        Some(
            widths
                .iter()
                .map(|w| {
                    let field = Bits(self.0[start..start + w].to_vec());
                    start += w;
                    field
                })
                .collect(),
        )
    }

    /// Join fields back together, the first field landing at line 0
    #[must_use]
    pub fn concat(fields: &[Bits]) -> Self {
        Self(fields.iter().flat_map(|f| f.0.iter().copied()).collect())
    }
}

impl fmt::Display for Bits {
    /// Most significant bit first, i.e. the reverse of the line order
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: String = self
            .0
            .iter()
            .rev()
            .map(|&b| if b == 0 { '0' } else { '1' })
            .collect();
        f.pad(&s)
    }
}

impl From<Vec<u8>> for Bits {
    fn from(lines: Vec<u8>) -> Self {
        Self(lines)
    }
}

impl AsRef<[u8]> for Bits {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
