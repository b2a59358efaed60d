//! GPIO pin abstractions
//!
//! The pin multiplexing capability as seen by the controller core. Pins are
//! addressed by number; ownership bookkeeping (who holds which pin) lives in
//! the core, the platform only enforces that a pin is requested once.

use core::fmt;

/// GPIO pin identifier
///
/// Signed so that invalid identifiers such as `-1` can be expressed and
/// rejected by [`GpioPlatform::is_valid`] instead of wrapping around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId(pub i32);

impl PinId {
    /// Pin number as a table index, if non-negative
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpio{}", self.0)
    }
}

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Button or other digital input
    Input,
    /// LED or other digital output
    Output,
}

/// Errors reported by the pin platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioError {
    /// Pin number outside the platform's range
    InvalidPin,
    /// Pin already requested by someone else
    Busy,
    /// Operation on a pin that was never requested
    NotRequested,
    /// Operation not valid for the pin's current direction
    WrongDirection,
    /// Platform cannot honour the request (e.g. debounce not supported)
    Unsupported,
    /// Electrical or bus fault while driving the pin
    Hardware,
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            GpioError::InvalidPin => "pin number out of range",
            GpioError::Busy => "pin already requested",
            GpioError::NotRequested => "pin not requested",
            GpioError::WrongDirection => "operation not valid for pin direction",
            GpioError::Unsupported => "operation not supported by platform",
            GpioError::Hardware => "hardware fault",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for GpioError {}

/// Pin multiplexing capability
///
/// Implementations wrap the chip's GPIO block. Levels are logical: `true`
/// means high.
pub trait GpioPlatform {
    /// Check whether a pin number exists on this platform
    fn is_valid(&self, pin: PinId) -> bool;

    /// Claim a pin for exclusive use
    fn request(&mut self, pin: PinId) -> Result<(), GpioError>;

    /// Configure a requested pin as output, driving `high` immediately
    fn set_output(&mut self, pin: PinId, high: bool) -> Result<(), GpioError>;

    /// Configure a requested pin as input
    fn set_input(&mut self, pin: PinId) -> Result<(), GpioError>;

    /// Ask the platform to suppress re-triggers within `debounce_ms`
    ///
    /// Platforms without debounce support return [`GpioError::Unsupported`];
    /// callers treat that as non-fatal.
    fn set_debounce(&mut self, pin: PinId, debounce_ms: u32) -> Result<(), GpioError>;

    /// Make a requested pin externally visible
    ///
    /// Must be idempotent.
    fn export(&mut self, pin: PinId) -> Result<(), GpioError>;

    /// Withdraw external visibility; no-op when not exported
    fn unexport(&mut self, pin: PinId);

    /// Read the current level of a requested pin
    fn read(&mut self, pin: PinId) -> Result<bool, GpioError>;

    /// Drive an output pin
    fn write(&mut self, pin: PinId, high: bool) -> Result<(), GpioError>;

    /// Give a pin back; no-op when not requested
    fn free(&mut self, pin: PinId);
}
