use embedded_hal::{digital, spi};
use thiserror::Error;

/// A channel index outside `0..=7`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("ADC channel must be between 0 and 7, got {0}")]
pub struct InvalidChannel(pub i32);

/// Errors raised while registering or reading the converter.
///
/// `E` is the error type of the [`Peripherals`](crate::Peripherals) used to open lines and buses.
#[derive(Error, Debug, PartialEq)]
pub enum Error<E> {
    #[error(transparent)]
    InvalidChannel(#[from] InvalidChannel),

    #[error("failed to open peripheral: {0:?}")]
    Open(E),

    #[error("GPIO line fault: {0}")]
    Pin(digital::ErrorKind),

    #[error("SPI transfer fault: {0}")]
    Bus(spi::ErrorKind),

    /// Peripheral access could not be obtained, or the transport has not been registered.
    #[error("peripheral access unavailable or transport not registered")]
    MissingDependency,
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Io,
    MissingDependency,
}

impl<E> Error<E> {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidChannel(_) => ErrorKind::Validation,
            Error::Open(_) | Error::Pin(_) | Error::Bus(_) => ErrorKind::Io,
            Error::MissingDependency => ErrorKind::MissingDependency,
        }
    }

    pub(crate) fn bus(err: impl spi::Error) -> Self {
        Error::Bus(err.kind())
    }
}
