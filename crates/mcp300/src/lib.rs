//! Provides a driver for a Microchip MCP3008 ADC via the `embedded-hal` ecosystem.
//!
//! The converter is reached either over a hardware SPI bus ([`spi::HardwareBus`]) or by
//! bit-banging four GPIO lines ([`bitbang::BitBanged`]). [`Mcp3008`] binds one of the two,
//! opens its lines or bus through an injected [`PeripheralAccess`], and reads batches of channels.

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod bitbang;
pub mod channel;
mod error;
pub mod mcp3008;
pub mod peripheral;
pub mod sensor;
pub mod spi;
pub mod transport;

#[cfg(test)]
mod mock;

pub use bitbang::PinAssignment;
pub use channel::Channel;
pub use error::{Error, ErrorKind, InvalidChannel};
pub use mcp3008::Mcp3008;
pub use peripheral::{PeripheralAccess, Peripherals, Released};
pub use sensor::{Mcp3008Sensor, ReportingMode};
pub use spi::BusConfig;
pub use transport::{ReadChannel, TransportKind};
