//! Hardware SPI transport.

use alloc::string::String;

use embedded_hal::spi::{Mode, SpiDevice, MODE_0};
use log::{debug, trace};

use crate::channel::Channel;
use crate::error::Error;
use crate::peripheral::{Peripherals, Released};
use crate::transport::ReadChannel;

/// Start flag, sent alone in the first byte.
const START: u8 = 0b0000_0001;

/// Single-ended conversion flag, top bit of the second byte.
const SINGLE_ENDED: u8 = 0b1000_0000;

/// B9 and B8 in the second response byte, B7 - B0 in the third.
const RESULT_MASK: u16 = 0b0000_0011_1111_1111;

/// Bit order on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

/// Which bus the converter sits on and how that bus must be set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    pub bus: String,
    pub mode: Mode,
    pub frequency: u32,
    pub bits_per_word: u8,
    pub bit_order: BitOrder,
}

impl BusConfig {
    pub const MODE: Mode = MODE_0;

    /// Maximum clock at V_DD = 2.7V.
    pub const FREQUENCY: u32 = 1_350_000;

    pub const BITS_PER_WORD: u8 = 8;

    pub const BIT_ORDER: BitOrder = BitOrder::MsbFirst;

    pub fn new(bus: impl Into<String>) -> Self {
        Self {
            bus: bus.into(),
            mode: Self::MODE,
            frequency: Self::FREQUENCY,
            bits_per_word: Self::BITS_PER_WORD,
            bit_order: Self::BIT_ORDER,
        }
    }
}

/// Builds the 3-byte request for a single-ended conversion of `channel`.
pub fn build_frame(channel: Channel) -> [u8; 3] {
    [START, SINGLE_ENDED | (channel.index() << 4), 0b0000_0000]
}

/// Extracts the 10-bit result from a 3-byte response, discarding the null bit and undefined bits.
pub fn extract_reading(response: [u8; 3]) -> u16 {
    u16::from_be_bytes([response[1], response[2]]) & RESULT_MASK
}

/// MCP3008 over a hardware SPI bus.
/// The bus is opened in SPI mode 0, aka (0, 0), at [`BusConfig::FREQUENCY`].
pub struct HardwareBus<SPI> {
    config: BusConfig,
    spi: Option<SPI>,
}

impl<SPI: SpiDevice> HardwareBus<SPI> {
    pub fn new(config: BusConfig) -> Self {
        Self { config, spi: None }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.spi.is_some()
    }

    pub fn open<P>(&mut self, peripherals: &mut P) -> Result<(), Error<P::Error>>
    where
        P: Peripherals<Bus = SPI>,
    {
        let spi = peripherals.open_bus(&self.config).map_err(Error::Open)?;

        debug!("opened SPI bus {}", self.config.bus);

        self.spi = Some(spi);

        Ok(())
    }

    pub fn close<P>(&mut self, peripherals: &mut P) -> Released
    where
        P: Peripherals<Bus = SPI>,
    {
        let mut released = Released::default();

        if let Some(spi) = self.spi.take() {
            released.record("SPI bus", peripherals.close_bus(spi));

            debug!("closed SPI bus {}", self.config.bus);
        }

        released
    }
}

impl<SPI: SpiDevice> ReadChannel for HardwareBus<SPI> {
    fn read_channel<E>(&mut self, channel: Channel) -> Result<u16, Error<E>> {
        let spi = self.spi.as_mut().ok_or(Error::MissingDependency)?;

        let mut buffer = build_frame(channel);

        spi.transfer_in_place(&mut buffer).map_err(Error::bus)?;

        let result = extract_reading(buffer);

        trace!("{channel:?} = {result}");

        Ok(result)
    }
}
