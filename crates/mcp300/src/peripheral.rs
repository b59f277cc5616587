//! Access to the GPIO lines and SPI buses the converter is wired to.

use core::fmt::Debug;

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;
use log::warn;

use crate::spi::BusConfig;

/// Opens lines and buses by name.
///
/// Handles are returned by value and owned by the transport that opened them. The `close_*`
/// methods hand a handle back for release; the defaults simply drop it.
pub trait Peripherals {
    type Error: Debug;
    type Output: OutputPin;
    type Input: InputPin;
    type Bus: SpiDevice;

    /// Open a line as an output, initially driven low.
    fn open_output(&mut self, name: &str) -> Result<Self::Output, Self::Error>;

    /// Open a line as an input.
    fn open_input(&mut self, name: &str) -> Result<Self::Input, Self::Error>;

    /// Open the bus named in `config` and apply its mode, frequency, word size and bit order.
    fn open_bus(&mut self, config: &BusConfig) -> Result<Self::Bus, Self::Error>;

    fn close_output(&mut self, line: Self::Output) -> Result<(), Self::Error> {
        drop(line);
        Ok(())
    }

    fn close_input(&mut self, line: Self::Input) -> Result<(), Self::Error> {
        drop(line);
        Ok(())
    }

    fn close_bus(&mut self, bus: Self::Bus) -> Result<(), Self::Error> {
        drop(bus);
        Ok(())
    }
}

/// Produces the [`Peripherals`] a converter opens its transport with.
///
/// A converter obtains its peripherals once, on first registration, and reuses them afterwards.
/// Any `FnMut() -> Result<P, E>` works, e.g. `RpiPeripherals::new`.
pub trait PeripheralAccess {
    type Peripherals: Peripherals;
    type Error: Debug;

    fn obtain(&mut self) -> Result<Self::Peripherals, Self::Error>;
}

impl<F, P, E> PeripheralAccess for F
where
    F: FnMut() -> Result<P, E>,
    P: Peripherals,
    E: Debug,
{
    type Peripherals = P;
    type Error = E;

    fn obtain(&mut self) -> Result<P, E> {
        self()
    }
}

/// Outcome of releasing a transport's handles.
///
/// Release never fails from the caller's point of view; handles whose release reported an error
/// are counted in `failed` and are gone all the same.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Released {
    pub released: usize,
    pub failed: usize,
}

impl Released {
    /// `true` if every handle was released without error.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    pub(crate) fn record<E: Debug>(&mut self, what: &str, result: Result<(), E>) {
        match result {
            Ok(()) => self.released += 1,
            Err(err) => {
                warn!("failed to release {what}: {err:?}");
                self.failed += 1;
            }
        }
    }
}
