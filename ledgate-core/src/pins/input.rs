//! Debounce and edge configuration of inputs
//!
//! Debounce is a hint passed down to the platform. The core never filters
//! edges itself; whatever the platform delivers is treated as a clean press.

use ledgate_hal::{Edge, GpioError, GpioPlatform, Role};

use super::manager::{PinHandle, PinManager};
use crate::error::PinError;

/// Debounce and trigger settings of an input pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputConfig {
    /// Re-trigger suppression window requested from the platform
    pub debounce_ms: u32,
    /// Edge that counts as an event
    pub edge: Edge,
    /// Platform accepted the debounce request
    pub debounced: bool,
}

impl<P: GpioPlatform> PinManager<P> {
    /// Attach a debounce interval and trigger edge to an input
    ///
    /// A platform without debounce support is not an error: the pin is
    /// configured anyway and edges arrive undebounced.
    pub fn configure_input(
        &mut self,
        handle: PinHandle,
        debounce_ms: u32,
        edge: Edge,
    ) -> Result<InputConfig, PinError> {
        let idx = self.index_of(handle)?;
        if self.slots[idx].role != Role::Input {
            return Err(PinError::Platform {
                pin: handle.pin(),
                error: GpioError::WrongDirection,
            });
        }

        let debounced = match self.platform.set_debounce(handle.pin(), debounce_ms) {
            Ok(()) => true,
            Err(GpioError::Unsupported) => {
                warn!("{}: debounce not supported, edges arrive raw", handle.pin());
                false
            }
            Err(error) => {
                return Err(PinError::Platform {
                    pin: handle.pin(),
                    error,
                })
            }
        };

        let config = InputConfig {
            debounce_ms,
            edge,
            debounced,
        };
        self.slots[idx].input = Some(config);
        Ok(config)
    }

    /// Debounce and edge settings of an input, if configured
    pub fn input_config(&self, handle: PinHandle) -> Option<InputConfig> {
        let idx = self.index_of(handle).ok()?;
        self.slots[idx].input
    }
}
