//! [`Peripherals`] backed by the Raspberry Pi GPIO and SPI peripherals.

use std::fmt;

use embedded_hal::spi::{self, ErrorType, Operation, Phase, Polarity, SpiDevice};
use log::debug;
use mcp300::spi::BitOrder;
use mcp300::{BusConfig, Peripherals};
use rppal::gpio::{Gpio, InputPin, OutputPin, Pin};
use rppal::spi::{Bus, Mode, Segment, SlaveSelect, Spi};

use crate::names::{parse_bus, parse_line};

#[derive(Debug, thiserror::Error)]
pub enum RpiError {
    #[error("GPIO fault: {0}")]
    Gpio(#[from] rppal::gpio::Error),
    #[error("SPI fault: {0}")]
    Spi(#[from] rppal::spi::Error),
    #[error("unknown GPIO line {0:?}")]
    UnknownLine(String),
    #[error("unknown SPI bus {0:?}")]
    UnknownBus(String),
}

pub struct RpiPeripherals {
    gpio: Gpio,
}

impl RpiPeripherals {
    pub fn new() -> Result<Self, RpiError> {
        Ok(Self { gpio: Gpio::new()? })
    }

    fn pin(&self, name: &str) -> Result<Pin, RpiError> {
        let bcm = parse_line(name).ok_or_else(|| RpiError::UnknownLine(name.to_owned()))?;

        Ok(self.gpio.get(bcm)?)
    }
}

fn bus_for(index: u8) -> Option<Bus> {
    match index {
        0 => Some(Bus::Spi0),
        1 => Some(Bus::Spi1),
        2 => Some(Bus::Spi2),
        3 => Some(Bus::Spi3),
        4 => Some(Bus::Spi4),
        5 => Some(Bus::Spi5),
        6 => Some(Bus::Spi6),
        _ => None,
    }
}

fn slave_select_for(index: u8) -> Option<SlaveSelect> {
    match index {
        0 => Some(SlaveSelect::Ss0),
        1 => Some(SlaveSelect::Ss1),
        2 => Some(SlaveSelect::Ss2),
        _ => None,
    }
}

fn mode(mode: spi::Mode) -> Mode {
    match (mode.polarity, mode.phase) {
        (Polarity::IdleLow, Phase::CaptureOnFirstTransition) => Mode::Mode0,
        (Polarity::IdleLow, Phase::CaptureOnSecondTransition) => Mode::Mode1,
        (Polarity::IdleHigh, Phase::CaptureOnFirstTransition) => Mode::Mode2,
        (Polarity::IdleHigh, Phase::CaptureOnSecondTransition) => Mode::Mode3,
    }
}

impl Peripherals for RpiPeripherals {
    type Error = RpiError;
    type Output = OutputPin;
    type Input = InputPin;
    type Bus = RpiBus;

    fn open_output(&mut self, name: &str) -> Result<OutputPin, RpiError> {
        Ok(self.pin(name)?.into_output_low())
    }

    fn open_input(&mut self, name: &str) -> Result<InputPin, RpiError> {
        Ok(self.pin(name)?.into_input())
    }

    fn open_bus(&mut self, config: &BusConfig) -> Result<RpiBus, RpiError> {
        let (bus, slave_select) = parse_bus(&config.bus)
            .and_then(|(bus_index, ss_index)| {
                Some((bus_for(bus_index)?, slave_select_for(ss_index)?))
            })
            .ok_or_else(|| RpiError::UnknownBus(config.bus.clone()))?;

        let spi = Spi::new(bus, slave_select, config.frequency, mode(config.mode))?;

        spi.set_bits_per_word(config.bits_per_word)?;
        spi.set_bit_order(match config.bit_order {
            BitOrder::MsbFirst => rppal::spi::BitOrder::MsbFirst,
            BitOrder::LsbFirst => rppal::spi::BitOrder::LsbFirst,
        })?;

        debug!("{bus:?}/{slave_select:?} at {} Hz", config.frequency);

        Ok(RpiBus { spi })
    }
}

/// Hardware SPI with the bus's own slave select line as chip select.
pub struct RpiBus {
    spi: Spi,
}

#[derive(Debug)]
pub struct BusError(rppal::spi::Error);

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl spi::Error for BusError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

impl ErrorType for RpiBus {
    type Error = BusError;
}

impl SpiDevice for RpiBus {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), BusError> {
        // Write halves of every operation, so each can become one segment of a single transfer
        let writes: Vec<Vec<u8>> = operations
            .iter()
            .map(|operation| match operation {
                Operation::Read(words) => vec![0; words.len()],
                Operation::Write(words) | Operation::Transfer(_, words) => words.to_vec(),
                Operation::TransferInPlace(words) => words.to_vec(),
                Operation::DelayNs(_) => Vec::new(),
            })
            .collect();

        let segments: Vec<Segment> = operations
            .iter_mut()
            .zip(&writes)
            .map(|(operation, write)| match operation {
                Operation::Read(read) | Operation::Transfer(read, _) => Segment::new(read, write),
                Operation::TransferInPlace(words) => Segment::new(words, write),
                Operation::Write(_) => Segment::with_write(write),
                Operation::DelayNs(ns) => {
                    let mut segment = Segment::with_write(write);
                    segment.set_delay(ns.div_ceil(1_000).try_into().unwrap_or(u16::MAX));
                    segment
                }
            })
            .collect();

        self.spi.transfer_segments(&segments).map_err(BusError)
    }
}
