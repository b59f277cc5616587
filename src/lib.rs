//! An MCP3008-driven plucked-string instrument for the Raspberry Pi.

pub mod app;
pub mod names;

#[cfg(feature = "raspberry_pi")]
pub mod raspberry_pi;
