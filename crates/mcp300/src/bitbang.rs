//! Software SPI over four GPIO lines.
//!
//! The MCP3008 samples DIN on the rising edge of CLK and shifts DOUT out on the falling edge, so
//! the transport drives the data line before each clock pulse and samples after it.

use alloc::string::String;

use embedded_hal::digital::{self, InputPin, OutputPin, PinState};
use log::{debug, trace};

use crate::channel::Channel;
use crate::error::Error;
use crate::peripheral::{Peripherals, Released};
use crate::transport::ReadChannel;

/// Start bit and single-ended bit, followed by the 3 channel select bits.
const COMMAND: u8 = 0b1_1000;

/// Command bits clocked out per conversion.
const COMMAND_BITS: usize = 5;

/// Clock pulses spent collecting the result, null bit included.
const SAMPLE_BITS: usize = 12;

/// Names of the four lines the converter is wired to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinAssignment {
    pub chip_select: String,
    pub clock: String,
    pub data_out: String,
    pub data_in: String,
}

impl PinAssignment {
    /// `data_out` is driven by us (MOSI), `data_in` is driven by the converter (MISO).
    pub fn new(
        chip_select: impl Into<String>,
        clock: impl Into<String>,
        data_out: impl Into<String>,
        data_in: impl Into<String>,
    ) -> Self {
        Self {
            chip_select: chip_select.into(),
            clock: clock.into(),
            data_out: data_out.into(),
            data_in: data_in.into(),
        }
    }
}

struct Lines<O, I> {
    chip_select: O,
    clock: O,
    data_out: O,
    data_in: I,
}

impl<O: OutputPin, I: InputPin> Lines<O, I> {
    /// Falling edge on chip-select starts a conversion.
    fn select(&mut self) -> Result<(), digital::ErrorKind> {
        self.chip_select.set_high().map_err(kind)?;
        self.chip_select.set_low().map_err(kind)?;
        self.clock.set_low().map_err(kind)
    }

    fn pulse(&mut self) -> Result<(), digital::ErrorKind> {
        self.clock.set_high().map_err(kind)?;
        self.clock.set_low().map_err(kind)
    }

    fn send_command(&mut self, channel: Channel) -> Result<(), digital::ErrorKind> {
        // Left justify the 5 command bits
        let mut command = (COMMAND | channel.index()) << 3;

        for _ in 0..COMMAND_BITS {
            let bit = PinState::from(command & 0b1000_0000 != 0);
            self.data_out.set_state(bit).map_err(kind)?;
            command <<= 1;
            self.pulse()?;
        }

        Ok(())
    }

    fn collect(&mut self) -> Result<u16, digital::ErrorKind> {
        let mut value = 0;

        for _ in 0..SAMPLE_BITS {
            self.pulse()?;
            value <<= 1;
            if self.data_in.is_high().map_err(kind)? {
                value |= 1;
            }
        }

        self.chip_select.set_high().map_err(kind)?;

        // Null bit
        Ok(value >> 1)
    }
}

fn kind(err: impl digital::Error) -> digital::ErrorKind {
    err.kind()
}

/// Releases the outputs of a partial open and turns `err` into the open failure.
fn abandon<P: Peripherals, const N: usize>(
    peripherals: &mut P,
    lines: [P::Output; N],
    err: P::Error,
) -> Error<P::Error> {
    let mut released = Released::default();

    for line in lines {
        released.record("output line", peripherals.close_output(line));
    }

    debug!("open failed, released {} line(s)", released.released);

    Error::Open(err)
}

/// MCP3008 driven by toggling chip-select, clock and data-out and sampling data-in.
///
/// Results span 11 bits: 12 bits are clocked in and the accumulator is shifted right once.
pub struct BitBanged<O, I> {
    pins: PinAssignment,
    lines: Option<Lines<O, I>>,
}

impl<O: OutputPin, I: InputPin> BitBanged<O, I> {
    pub fn new(pins: PinAssignment) -> Self {
        Self { pins, lines: None }
    }

    pub fn pins(&self) -> &PinAssignment {
        &self.pins
    }

    pub fn is_open(&self) -> bool {
        self.lines.is_some()
    }

    /// Opens all four lines. On failure any line already opened is handed back to `peripherals`
    /// and the transport stays closed.
    pub fn open<P>(&mut self, peripherals: &mut P) -> Result<(), Error<P::Error>>
    where
        P: Peripherals<Output = O, Input = I>,
    {
        let pins = &self.pins;

        let clock = peripherals.open_output(&pins.clock).map_err(Error::Open)?;

        let chip_select = match peripherals.open_output(&pins.chip_select) {
            Ok(line) => line,
            Err(err) => return Err(abandon(peripherals, [clock], err)),
        };

        let data_out = match peripherals.open_output(&pins.data_out) {
            Ok(line) => line,
            Err(err) => return Err(abandon(peripherals, [clock, chip_select], err)),
        };

        let data_in = match peripherals.open_input(&pins.data_in) {
            Ok(line) => line,
            Err(err) => return Err(abandon(peripherals, [clock, chip_select, data_out], err)),
        };

        debug!(
            "opened GPIO lines cs={} clk={} dout={} din={}",
            pins.chip_select, pins.clock, pins.data_out, pins.data_in
        );

        self.lines = Some(Lines {
            chip_select,
            clock,
            data_out,
            data_in,
        });

        Ok(())
    }

    pub fn close<P>(&mut self, peripherals: &mut P) -> Released
    where
        P: Peripherals<Output = O, Input = I>,
    {
        let mut released = Released::default();

        if let Some(lines) = self.lines.take() {
            released.record("chip-select line", peripherals.close_output(lines.chip_select));
            released.record("clock line", peripherals.close_output(lines.clock));
            released.record("data-in line", peripherals.close_input(lines.data_in));
            released.record("data-out line", peripherals.close_output(lines.data_out));

            debug!("closed GPIO lines");
        }

        released
    }
}

impl<O: OutputPin, I: InputPin> ReadChannel for BitBanged<O, I> {
    fn read_channel<E>(&mut self, channel: Channel) -> Result<u16, Error<E>> {
        let lines = self.lines.as_mut().ok_or(Error::MissingDependency)?;

        lines.select().map_err(Error::Pin)?;
        lines.send_command(channel).map_err(Error::Pin)?;
        let result = lines.collect().map_err(Error::Pin)?;

        trace!("{channel:?} = {result}");

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Event, MockError, MockInput, MockOutput, MockPeripherals};
    use alloc::vec;
    use alloc::vec::Vec;

    fn pins() -> PinAssignment {
        PinAssignment::new("CS", "CLK", "DOUT", "DIN")
    }

    fn opened(peripherals: &mut MockPeripherals) -> BitBanged<MockOutput, MockInput> {
        let mut adc = BitBanged::new(pins());
        adc.open(peripherals).unwrap();
        peripherals.board.borrow_mut().events.clear();
        adc
    }

    fn set(line: &str, level: bool) -> Event {
        Event::Set(line.into(), level)
    }

    #[test]
    fn open_opens_all_lines_low() {
        let mut peripherals = MockPeripherals::new();
        let mut adc = BitBanged::new(pins());

        adc.open(&mut peripherals).unwrap();

        assert!(adc.is_open());
        assert_eq!(peripherals.board.borrow().opened, ["CLK", "CS", "DOUT", "DIN"]);
    }

    #[test]
    fn open_failure_leaves_lines_closed() {
        let mut peripherals = MockPeripherals::new();
        peripherals.board.borrow_mut().fail_open = Some("DIN".into());
        let mut adc = BitBanged::new(pins());

        assert_eq!(adc.open(&mut peripherals), Err(Error::Open(MockError)));
        assert!(!adc.is_open());
        assert_eq!(peripherals.board.borrow().closed, ["CLK", "CS", "DOUT"]);
    }

    #[test]
    fn open_failure_releases_only_opened_lines() {
        let mut peripherals = MockPeripherals::new();
        peripherals.board.borrow_mut().fail_open = Some("CS".into());
        let mut adc = BitBanged::new(pins());

        assert_eq!(adc.open(&mut peripherals), Err(Error::Open(MockError)));
        assert!(!adc.is_open());
        assert_eq!(peripherals.board.borrow().closed, ["CLK"]);
    }

    #[test]
    fn read_clocks_command_then_samples() {
        let mut peripherals = MockPeripherals::new();
        let mut adc = opened(&mut peripherals);

        adc.read_channel::<MockError>(Channel::CH5).unwrap();

        let board = peripherals.board.borrow();

        let mut expected = vec![set("CS", true), set("CS", false), set("CLK", false)];
        // start, single-ended, then 0b101
        for bit in [true, true, true, false, true] {
            expected.extend([set("DOUT", bit), set("CLK", true), set("CLK", false)]);
        }
        for _ in 0..SAMPLE_BITS {
            expected.extend([set("CLK", true), set("CLK", false), Event::Sample("DIN".into())]);
        }
        expected.push(set("CS", true));

        assert_eq!(board.events, expected);
    }

    #[test]
    fn read_drops_null_bit() {
        let mut peripherals = MockPeripherals::new();
        let mut adc = opened(&mut peripherals);

        let bits: Vec<bool> = [0, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 1]
            .into_iter()
            .map(|bit| bit == 1)
            .collect();
        peripherals.board.borrow_mut().input.extend(bits);

        assert_eq!(adc.read_channel::<MockError>(Channel::CH0), Ok(896));
    }

    #[test]
    fn read_spans_eleven_bits() {
        let mut peripherals = MockPeripherals::new();
        let mut adc = opened(&mut peripherals);
        peripherals.board.borrow_mut().input.extend([true; SAMPLE_BITS]);

        assert_eq!(adc.read_channel::<MockError>(Channel::CH7), Ok(2047));
    }

    #[test]
    fn read_before_open_is_missing_dependency() {
        let mut adc = BitBanged::<MockOutput, MockInput>::new(pins());

        assert_eq!(
            adc.read_channel::<MockError>(Channel::CH0),
            Err(Error::MissingDependency)
        );
    }

    #[test]
    fn close_releases_every_line_once() {
        let mut peripherals = MockPeripherals::new();
        let mut adc = opened(&mut peripherals);

        assert_eq!(adc.close(&mut peripherals), Released { released: 4, failed: 0 });
        assert_eq!(adc.close(&mut peripherals), Released::default());
        assert!(!adc.is_open());
        assert_eq!(peripherals.board.borrow().closed, ["CS", "CLK", "DIN", "DOUT"]);
    }

    #[test]
    fn close_swallows_failures() {
        let mut peripherals = MockPeripherals::new();
        let mut adc = opened(&mut peripherals);
        peripherals.board.borrow_mut().fail_close = true;

        assert_eq!(adc.close(&mut peripherals), Released { released: 0, failed: 4 });
        assert!(!adc.is_open());
    }

    #[test]
    fn data_out_follows_channel_bits() {
        let mut peripherals = MockPeripherals::new();
        let mut adc = opened(&mut peripherals);

        for channel in Channel::all() {
            peripherals.board.borrow_mut().events.clear();
            adc.read_channel::<MockError>(channel).unwrap();

            let index = channel.index();
            let expected = [true, true, index & 4 != 0, index & 2 != 0, index & 1 != 0];
            assert_eq!(peripherals.board.borrow().writes_to("DOUT"), expected);
        }
    }
}
