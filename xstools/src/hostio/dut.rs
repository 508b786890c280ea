//! Generic devices-under-test with binary input and output lines
use super::{
    Error,
    Result,
};
use crate::{
    core::{
        total_width,
        Bits,
        DutWidths,
        ModuleId,
        UsbId,
    },
    device::{
        Board,
        DutDevice,
    },
};
use tracing::debug;

/// A circuit in the FPGA that takes a vector of input bits and produces a vector of output bits.
///
/// The inputs and outputs can be partitioned into fields (e.g. two operands in, a result and a
/// carry out), the first field always starting at line 0. Every write is also one clock edge
/// of a sequential circuit, reads never advance it.
#[derive(Debug)]
pub struct Dut<D> {
    device: D,
    widths: DutWidths,
    input_fields: Vec<usize>,
    output_fields: Vec<usize>,
}

fn check_fields(side: &'static str, fields: &[usize], lines: usize) -> Result<()> {
    match total_width(fields) {
        Some(total) if total == lines => Ok(()),
        total => Err(Error::FieldMismatch {
            side,
            fields: total.unwrap_or(usize::MAX),
            lines,
        }),
    }
}

impl<D> Dut<D>
where
    D: DutDevice,
{
    /// Open the DUT module `module` on the board at USB index `usb`, treating all inputs and all
    /// outputs as one field each
    /// # Errors
    /// Returns [`crate::device::Error::DeviceUnavailable`] (wrapped) if the module can't be
    /// opened
    pub fn open<B>(board: &B, usb: UsbId, module: ModuleId) -> Result<Self>
    where
        B: Board<Dut = D>,
    {
        let dut = Self::new(board.open_dut(usb, module)?);
        debug!(
            usb,
            module,
            num_inputs = dut.widths.num_inputs,
            num_outputs = dut.widths.num_outputs,
            "Opened DUT"
        );
        Ok(dut)
    }

    /// Open the DUT module `module` with its lines split into fields of the given widths
    /// # Errors
    /// Returns an error if the module can't be opened or if the field widths don't add up to the
    /// DUT's line counts
    pub fn open_with_fields<B>(
        board: &B,
        usb: UsbId,
        module: ModuleId,
        input_fields: &[usize],
        output_fields: &[usize],
    ) -> Result<Self>
    where
        B: Board<Dut = D>,
    {
        Self::open(board, usb, module)?.with_fields(input_fields, output_fields)
    }

    /// Wrap an already opened DUT device
    #[must_use]
    pub fn new(device: D) -> Self {
        let widths = device.widths();
        Self {
            device,
            widths,
            input_fields: vec![widths.num_inputs],
            output_fields: vec![widths.num_outputs],
        }
    }

    /// Repartition the lines into fields
    /// # Errors
    /// Returns an error if the field widths don't add up to the DUT's line counts
    pub fn with_fields(mut self, input_fields: &[usize], output_fields: &[usize]) -> Result<Self> {
        check_fields("input", input_fields, self.widths.num_inputs)?;
        check_fields("output", output_fields, self.widths.num_outputs)?;
        self.input_fields = input_fields.to_vec();
        self.output_fields = output_fields.to_vec();
        Ok(self)
    }

    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.widths.num_inputs
    }

    #[must_use]
    pub fn num_outputs(&self) -> usize {
        self.widths.num_outputs
    }

    #[must_use]
    pub fn input_fields(&self) -> &[usize] {
        &self.input_fields
    }

    #[must_use]
    pub fn output_fields(&self) -> &[usize] {
        &self.output_fields
    }

    /// The underlying device
    #[must_use]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Drive the inputs with the packed integer `value`, bit 0 on input line 0. Bits above
    /// `num_inputs` are dropped.
    /// # Errors
    /// Returns [`Error::EmptyTransfer`] if the DUT has no inputs, or an error on device errors
    pub fn write(&mut self, value: u64) -> Result<()> {
        let bits = Bits::from_value(value, self.widths.num_inputs);
        self.drive(bits.lines())
    }

    fn drive(&mut self, lines: &[u8]) -> Result<()> {
        if lines.is_empty() {
            return Err(Error::EmptyTransfer);
        }
        self.device.write_lines(lines)?;
        Ok(())
    }

    fn sample(&mut self, lines: &mut [u8]) -> Result<()> {
        if lines.is_empty() {
            return Err(Error::EmptyTransfer);
        }
        self.device.read_lines(lines)?;
        Ok(())
    }

    /// Drive the inputs with explicit line values, index 0 on input line 0
    /// # Errors
    /// Returns an error if `lines` isn't exactly `num_inputs` long or on device errors
    pub fn write_lines(&mut self, lines: &[u8]) -> Result<()> {
        if lines.len() != self.widths.num_inputs {
            return Err(Error::BadSize {
                expected: self.widths.num_inputs,
                got: lines.len(),
            });
        }
        self.drive(lines)
    }

    /// Drive the inputs with a bit vector
    /// # Errors
    /// Returns an error if `bits` isn't exactly `num_inputs` long or on device errors
    pub fn write_bits(&mut self, bits: &Bits) -> Result<()> {
        self.write_lines(bits.lines())
    }

    /// Drive each input field with its own integer, in field order
    /// # Errors
    /// Returns an error if there isn't one value per input field or on device errors
    pub fn write_fields(&mut self, values: &[u64]) -> Result<()> {
        if values.len() != self.input_fields.len() {
            return Err(Error::BadSize {
                expected: self.input_fields.len(),
                got: values.len(),
            });
        }
        let fields: Vec<Bits> = values
            .iter()
            .zip(&self.input_fields)
            .map(|(&v, &w)| Bits::from_value(v, w))
            .collect();
        self.write_bits(&Bits::concat(&fields))
    }

    /// Sample the outputs in one transfer. The result carries both the line view and the packed
    /// integer view ([`Bits::value`]) of that same transfer.
    /// # Errors
    /// Returns [`Error::EmptyTransfer`] if the DUT has no outputs, or an error on device errors
    pub fn read(&mut self) -> Result<Bits> {
        let mut lines = vec![0u8; self.widths.num_outputs];
        self.sample(&mut lines)?;
        Ok(Bits::from_lines(lines))
    }

    /// Sample the outputs as a packed integer, the highest line being the most significant bit
    /// # Errors
    /// Returns an error on device errors
    pub fn read_value(&mut self) -> Result<u64> {
        Ok(self.read()?.value())
    }

    /// Sample the outputs into `lines`, returning the packed integer of that same transfer
    /// # Errors
    /// Returns an error if `lines` isn't exactly `num_outputs` long or on device errors
    pub fn read_into(&mut self, lines: &mut [u8]) -> Result<u64> {
        if lines.len() != self.widths.num_outputs {
            return Err(Error::BadSize {
                expected: self.widths.num_outputs,
                got: lines.len(),
            });
        }
        self.sample(lines)?;
        Ok(Bits::from_lines(lines.to_vec()).value())
    }

    /// Sample the outputs in one transfer, split by output field
    /// # Errors
    /// Returns an error on device errors or if the output fields don't cover the lines read
    pub fn read_fields(&mut self) -> Result<Vec<Bits>> {
        let bits = self.read()?;
        bits.split(&self.output_fields)
            .ok_or_else(|| Error::FieldMismatch {
                side: "output",
                fields: total_width(&self.output_fields).unwrap_or(usize::MAX),
                lines: bits.len(),
            })
    }

    /// Apply `value` to the inputs, then sample the outputs
    /// # Errors
    /// Returns an error on device errors
    pub fn exec(&mut self, value: u64) -> Result<Bits> {
        self.write(value)?;
        self.read()
    }

    /// Apply one value per input field, then sample the outputs split by output field
    /// # Errors
    /// Returns an error if there isn't one value per input field or on device errors
    pub fn exec_fields(&mut self, values: &[u64]) -> Result<Vec<Bits>> {
        self.write_fields(values)?;
        self.read_fields()
    }
}
