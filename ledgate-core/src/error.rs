//! Error taxonomy
//!
//! Each layer has its own small `Copy` error type; [`Error`] is what the
//! lifecycle controller reports to the operator, tagged with the channel
//! label the failure belongs to.

use core::fmt;

use ledgate_hal::{GpioError, IrqError, IrqLine, PinId};

/// Pin resource manager errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Identifier outside the platform's valid range
    InvalidPin(PinId),
    /// Pin already held by this manager
    AlreadyAcquired(PinId),
    /// Handle refers to a pin this manager does not hold
    NotAcquired(PinId),
    /// Manager has no room for another pin
    NoFreeSlot(PinId),
    /// Platform rejected the operation
    Platform { pin: PinId, error: GpioError },
}

impl PinError {
    /// Pin the error refers to
    pub fn pin(&self) -> PinId {
        match *self {
            PinError::InvalidPin(pin)
            | PinError::AlreadyAcquired(pin)
            | PinError::NotAcquired(pin)
            | PinError::NoFreeSlot(pin)
            | PinError::Platform { pin, .. } => pin,
        }
    }
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinError::InvalidPin(pin) => write!(f, "{pin} is not a valid pin"),
            PinError::AlreadyAcquired(pin) => write!(f, "{pin} is already acquired"),
            PinError::NotAcquired(pin) => write!(f, "{pin} is not acquired"),
            PinError::NoFreeSlot(pin) => write!(f, "no free slot to acquire {pin}"),
            PinError::Platform { pin, error } => write!(f, "{pin}: {error}"),
        }
    }
}

impl core::error::Error for PinError {}

/// Interrupt registration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterError {
    /// Pin cannot generate interrupts
    NoInterruptCapability(PinId),
    /// Line already has a handler
    AlreadyBound(IrqLine),
    /// Table or platform has no room for another line
    ResourceExhausted(IrqLine),
    /// Platform rejected arming the line
    Platform { line: IrqLine, error: IrqError },
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::NoInterruptCapability(pin) => {
                write!(f, "{pin} cannot generate interrupts")
            }
            RegisterError::AlreadyBound(line) => write!(f, "{line} already has a handler"),
            RegisterError::ResourceExhausted(line) => {
                write!(f, "no interrupt resources left for {line}")
            }
            RegisterError::Platform { line, error } => write!(f, "{line}: {error}"),
        }
    }
}

impl core::error::Error for RegisterError {}

/// Board configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Same pin assigned to two channels
    DuplicatePin(PinId),
    /// Button refers to an LED index that does not exist
    UnknownLed { button: &'static str },
    /// LED has no button that switches it on
    MissingSetButton { led: &'static str },
    /// LED has no button that switches it off
    MissingClearButton { led: &'static str },
    /// Debounce interval of zero
    ZeroDebounce,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::DuplicatePin(pin) => write!(f, "{pin} is assigned twice"),
            ConfigError::UnknownLed { button } => {
                write!(f, "button {button} refers to an unknown LED")
            }
            ConfigError::MissingSetButton { led } => write!(f, "LED {led} has no set button"),
            ConfigError::MissingClearButton { led } => {
                write!(f, "LED {led} has no clear button")
            }
            ConfigError::ZeroDebounce => f.write_str("debounce interval must be non-zero"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Controller errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A channel's pin failed validation; initialization aborted
    InvalidPin { channel: &'static str, pin: PinId },
    /// Requesting, configuring or exporting a channel's pin failed
    PinSetup {
        channel: &'static str,
        error: PinError,
    },
    /// Mapping or registering a button's interrupt line failed
    RegistrationFailure {
        channel: &'static str,
        error: RegisterError,
    },
    /// Driving an output failed
    HardwareWriteFailure {
        channel: &'static str,
        error: PinError,
    },
    /// Board configuration is inconsistent
    Config(ConfigError),
    /// `start()` called while already started
    AlreadyStarted,
}

impl Error {
    /// Attach a channel label to a pin manager error
    pub(crate) fn pin_setup(channel: &'static str, error: PinError) -> Self {
        match error {
            PinError::InvalidPin(pin) => Error::InvalidPin { channel, pin },
            error => Error::PinSetup { channel, error },
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPin { channel, pin } => {
                write!(f, "invalid pin {pin} for channel {channel}")
            }
            Error::PinSetup { channel, error } => {
                write!(f, "pin setup failed for channel {channel}: {error}")
            }
            Error::RegistrationFailure { channel, error } => {
                write!(f, "interrupt registration failed for channel {channel}: {error}")
            }
            Error::HardwareWriteFailure { channel, error } => {
                write!(f, "write failed on channel {channel}: {error}")
            }
            Error::Config(error) => write!(f, "invalid board configuration: {error}"),
            Error::AlreadyStarted => f.write_str("controller already started"),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Error::PinSetup { error, .. } | Error::HardwareWriteFailure { error, .. } => {
                Some(error)
            }
            Error::RegistrationFailure { error, .. } => Some(error),
            Error::Config(error) => Some(error),
            Error::InvalidPin { .. } | Error::AlreadyStarted => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        Error::Config(error)
    }
}
