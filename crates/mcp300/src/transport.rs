//! Channel reads, and the choice between the two transports.

use alloc::vec::Vec;

use log::debug;

use crate::bitbang::{BitBanged, PinAssignment};
use crate::channel::Channel;
use crate::error::Error;
use crate::peripheral::{Peripherals, Released};
use crate::spi::{BusConfig, HardwareBus};

/// Reads one conversion result per call.
pub trait ReadChannel {
    /// Read `channel` in single-ended mode.
    fn read_channel<E>(&mut self, channel: Channel) -> Result<u16, Error<E>>;

    /// Validate `index` and read it. Nothing touches the hardware if `index` is out of range.
    fn read_index<E>(&mut self, index: i32) -> Result<u16, Error<E>> {
        let channel = Channel::try_from(index)?;
        self.read_channel(channel)
    }

    /// Read each index in order, stopping at the first failure.
    fn read_indices<E>(&mut self, indices: &[i32]) -> Result<Vec<u16>, Error<E>> {
        indices.iter().map(|&index| self.read_index(index)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    BitBanged,
    HardwareBus,
}

/// The transport a converter was built with. Fixed for the converter's lifetime.
pub enum Transport<P: Peripherals> {
    BitBanged(BitBanged<P::Output, P::Input>),
    HardwareBus(HardwareBus<P::Bus>),
}

impl<P: Peripherals> Transport<P> {
    pub fn bit_banged(pins: PinAssignment) -> Self {
        Transport::BitBanged(BitBanged::new(pins))
    }

    pub fn hardware_bus(config: BusConfig) -> Self {
        Transport::HardwareBus(HardwareBus::new(config))
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            Transport::BitBanged(_) => TransportKind::BitBanged,
            Transport::HardwareBus(_) => TransportKind::HardwareBus,
        }
    }

    pub fn is_open(&self) -> bool {
        match self {
            Transport::BitBanged(adc) => adc.is_open(),
            Transport::HardwareBus(adc) => adc.is_open(),
        }
    }

    /// Opens the transport, releasing any handles left from a previous open first.
    pub fn open(&mut self, peripherals: &mut P) -> Result<(), Error<P::Error>> {
        if self.is_open() {
            let released = self.close(peripherals);

            debug!(
                "released {} handle(s) before reopening, {} failed",
                released.released, released.failed
            );
        }

        match self {
            Transport::BitBanged(adc) => adc.open(peripherals),
            Transport::HardwareBus(adc) => adc.open(peripherals),
        }
    }

    pub fn close(&mut self, peripherals: &mut P) -> Released {
        match self {
            Transport::BitBanged(adc) => adc.close(peripherals),
            Transport::HardwareBus(adc) => adc.close(peripherals),
        }
    }
}

impl<P: Peripherals> ReadChannel for Transport<P> {
    fn read_channel<E>(&mut self, channel: Channel) -> Result<u16, Error<E>> {
        match self {
            Transport::BitBanged(adc) => adc.read_channel(channel),
            Transport::HardwareBus(adc) => adc.read_channel(channel),
        }
    }
}
