//! The MCP3008 converter: one transport, its lifecycle, and batch reads.

use alloc::vec::Vec;

use log::{debug, warn};

use crate::bitbang::PinAssignment;
use crate::channel::Channel;
use crate::error::Error;
use crate::peripheral::{PeripheralAccess, Peripherals, Released};
use crate::spi::BusConfig;
use crate::transport::{ReadChannel, Transport, TransportKind};

/// Error type of the peripherals obtained through `A`.
pub type PeripheralError<A> = <<A as PeripheralAccess>::Peripherals as Peripherals>::Error;

/// MCP3008 driver
///
/// Owns exactly one transport, chosen at construction. Handles are opened by
/// [`register`](Self::register) and released by [`unregister`](Self::unregister), or on drop.
pub struct Mcp3008<A: PeripheralAccess> {
    access: A,
    peripherals: Option<A::Peripherals>,
    transport: Transport<A::Peripherals>,
}

impl<A: PeripheralAccess> Mcp3008<A> {
    /// Creates a driver that bit-bangs the protocol over four GPIO lines.
    pub fn bit_banged(pins: PinAssignment, access: A) -> Self {
        Self::with_transport(Transport::bit_banged(pins), access)
    }

    /// Creates a driver on a hardware SPI bus.
    pub fn hardware_bus(config: BusConfig, access: A) -> Self {
        Self::with_transport(Transport::hardware_bus(config), access)
    }

    fn with_transport(transport: Transport<A::Peripherals>, access: A) -> Self {
        Self {
            access,
            peripherals: None,
            transport,
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// `true` between a successful [`register`](Self::register) and the next
    /// [`unregister`](Self::unregister).
    pub fn is_registered(&self) -> bool {
        self.transport.is_open()
    }

    /// Obtains peripheral access if not already held, then opens the transport.
    ///
    /// Registering an already registered driver releases and reopens its handles.
    pub fn register(&mut self) -> Result<(), Error<PeripheralError<A>>> {
        if self.peripherals.is_none() {
            let peripherals = self.access.obtain().map_err(|err| {
                warn!("peripheral access unavailable: {err:?}");
                Error::MissingDependency
            })?;

            self.peripherals = Some(peripherals);
        }

        let Some(peripherals) = self.peripherals.as_mut() else {
            return Err(Error::MissingDependency);
        };

        self.transport.open(peripherals)?;

        debug!("registered {:?} transport", self.transport.kind());

        Ok(())
    }

    /// Read a single channel.
    pub fn read(&mut self, channel: Channel) -> Result<u16, Error<PeripheralError<A>>> {
        self.transport.read_channel(channel)
    }

    /// Read each channel index in order and return the readings in the same order.
    ///
    /// Fails with [`Error::MissingDependency`] before [`register`](Self::register), and with
    /// [`Error::InvalidChannel`] at the first index outside `0..=7`. Readings taken before a
    /// failure are discarded.
    pub fn read_adc(&mut self, channels: &[i32]) -> Result<Vec<u16>, Error<PeripheralError<A>>> {
        if !self.transport.is_open() {
            return Err(Error::MissingDependency);
        }

        self.transport.read_indices(channels)
    }

    /// Releases the transport's handles. Never fails, and does nothing if nothing is open.
    pub fn unregister(&mut self) -> Released {
        let Some(peripherals) = self.peripherals.as_mut() else {
            return Released::default();
        };

        let released = self.transport.close(peripherals);

        if !released.is_clean() {
            warn!("{} handle(s) failed to release cleanly", released.failed);
        }

        released
    }

    /// Same as [`unregister`](Self::unregister).
    pub fn close(&mut self) -> Released {
        self.unregister()
    }
}

impl<A: PeripheralAccess> Drop for Mcp3008<A> {
    fn drop(&mut self) {
        let _ = self.unregister();
    }
}
