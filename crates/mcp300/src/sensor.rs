//! A polled sensor source built on [`Mcp3008`].

use alloc::vec;
use alloc::vec::Vec;

use log::debug;

use crate::bitbang::PinAssignment;
use crate::error::Error;
use crate::mcp3008::{Mcp3008, PeripheralError};
use crate::peripheral::{PeripheralAccess, Released};
use crate::spi::BusConfig;

pub const DRIVER_NAME: &str = "MCP3008";

pub const DEFAULT_PIN_CS: &str = "GPIO1_IO10";
pub const DEFAULT_PIN_CLOCK: &str = "GPIO6_IO13";
pub const DEFAULT_PIN_DATA_OUT: &str = "GPIO6_IO12";
pub const DEFAULT_PIN_DATA_IN: &str = "GPIO5_IO00";
pub const DEFAULT_SPI_NAME: &str = "SPI3.0";
pub const DEFAULT_CHANNEL: i32 = 0;

/// Lines of the reference board.
pub fn default_pins() -> PinAssignment {
    PinAssignment::new(
        DEFAULT_PIN_CS,
        DEFAULT_PIN_CLOCK,
        DEFAULT_PIN_DATA_OUT,
        DEFAULT_PIN_DATA_IN,
    )
}

/// Bus of the reference board.
pub fn default_bus() -> BusConfig {
    BusConfig::new(DEFAULT_SPI_NAME)
}

/// How often a registered sensor should be polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportingMode {
    Continuous,
    /// Low power: report only when the value changes.
    OnChange,
}

/// Samples a fixed, ordered list of channels as floating point values.
pub struct Mcp3008Sensor<A: PeripheralAccess> {
    adc: Mcp3008<A>,
    channels: Vec<i32>,
    mode: Option<ReportingMode>,
}

impl<A: PeripheralAccess> Mcp3008Sensor<A> {
    pub fn new(adc: Mcp3008<A>, channels: Vec<i32>) -> Self {
        Self {
            adc,
            channels,
            mode: None,
        }
    }

    /// Samples only [`DEFAULT_CHANNEL`].
    pub fn with_default_channel(adc: Mcp3008<A>) -> Self {
        Self::new(adc, vec![DEFAULT_CHANNEL])
    }

    pub fn channels(&self) -> &[i32] {
        &self.channels
    }

    /// `None` while unregistered.
    pub fn reporting_mode(&self) -> Option<ReportingMode> {
        self.mode
    }

    pub fn is_registered(&self) -> bool {
        self.mode.is_some()
    }

    pub fn register(&mut self) -> Result<(), Error<PeripheralError<A>>> {
        self.adc.register()?;
        self.mode = Some(ReportingMode::Continuous);

        debug!("{DRIVER_NAME} sensor registered for channels {:?}", self.channels);

        Ok(())
    }

    /// Releases the converter. Does nothing unless registered.
    pub fn unregister(&mut self) -> Released {
        if self.mode.take().is_none() {
            return Released::default();
        }

        debug!("{DRIVER_NAME} sensor unregistered");

        self.adc.unregister()
    }

    /// One value per configured channel, in order.
    pub fn read(&mut self) -> Result<Vec<f32>, Error<PeripheralError<A>>> {
        let readings = self.adc.read_adc(&self.channels)?;

        Ok(readings.into_iter().map(f32::from).collect())
    }

    /// Switches reporting cadence. Reads are unaffected.
    pub fn set_low_power_mode(&mut self, enabled: bool) {
        if let Some(mode) = self.mode.as_mut() {
            *mode = if enabled {
                ReportingMode::OnChange
            } else {
                ReportingMode::Continuous
            };
        }
    }
}
