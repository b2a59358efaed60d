//! Board wiring configuration
//!
//! Two LEDs, four buttons. Each LED is controlled by a "set" button that
//! forces it on and a "clear" button that forces it off.

use ledgate_hal::{Edge, PinId};

use crate::error::ConfigError;

/// Number of LED channels
pub const LED_COUNT: usize = 2;

/// Number of button channels
pub const BUTTON_COUNT: usize = 4;

/// Debounce interval requested from the platform for every button
pub const DEFAULT_DEBOUNCE_MS: u32 = 200;

/// Index of an LED channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedId(pub u8);

impl LedId {
    /// Position in the LED array
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a button does to its LED
///
/// Forced assignment, never a complement of the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedAction {
    /// Switch the LED on
    ForceOn,
    /// Switch the LED off
    ForceOff,
}

impl LedAction {
    /// Output level this action drives
    pub const fn level(self) -> bool {
        matches!(self, LedAction::ForceOn)
    }
}

/// LED output wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedConfig {
    /// Name used in logs and reports
    pub label: &'static str,
    /// Output pin
    pub pin: PinId,
}

/// Button input wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonConfig {
    /// Name used in logs and reports
    pub label: &'static str,
    /// Input pin
    pub pin: PinId,
    /// LED this button controls
    pub led: LedId,
    /// Effect on that LED
    pub action: LedAction,
    /// Invoke the external notification hook on each press
    pub notify: bool,
}

/// Complete board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardConfig {
    /// LED outputs
    pub leds: [LedConfig; LED_COUNT],
    /// Button inputs
    pub buttons: [ButtonConfig; BUTTON_COUNT],
    /// Debounce interval for all buttons
    pub debounce_ms: u32,
    /// Edge that counts as a press
    pub trigger: Edge,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BoardConfig {
    /// Reference wiring: LEDs on GPIO16/20, buttons on GPIO26/19 (LED1)
    /// and GPIO13/21 (LED2), notification on the first button only
    pub const DEFAULT: Self = Self {
        leds: [
            LedConfig {
                label: "LED1",
                pin: PinId(16),
            },
            LedConfig {
                label: "LED2",
                pin: PinId(20),
            },
        ],
        buttons: [
            ButtonConfig {
                label: "A1",
                pin: PinId(26),
                led: LedId(0),
                action: LedAction::ForceOn,
                notify: true,
            },
            ButtonConfig {
                label: "A2",
                pin: PinId(19),
                led: LedId(0),
                action: LedAction::ForceOff,
                notify: false,
            },
            ButtonConfig {
                label: "B1",
                pin: PinId(13),
                led: LedId(1),
                action: LedAction::ForceOn,
                notify: false,
            },
            ButtonConfig {
                label: "B2",
                pin: PinId(21),
                led: LedId(1),
                action: LedAction::ForceOff,
                notify: false,
            },
        ],
        debounce_ms: DEFAULT_DEBOUNCE_MS,
        trigger: Edge::Rising,
    };

    /// Iterate over every configured pin, LEDs first
    pub fn pins(&self) -> impl Iterator<Item = PinId> + '_ {
        self.leds
            .iter()
            .map(|l| l.pin)
            .chain(self.buttons.iter().map(|b| b.pin))
    }

    /// Find a button by label
    pub fn find_button(&self, label: &str) -> Option<&ButtonConfig> {
        self.buttons.iter().find(|b| b.label == label)
    }

    /// Check the wiring for internal consistency
    ///
    /// Pin ranges are not checked here; only the platform knows them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::ZeroDebounce);
        }

        for (i, pin) in self.pins().enumerate() {
            if self.pins().skip(i + 1).any(|other| other == pin) {
                return Err(ConfigError::DuplicatePin(pin));
            }
        }

        for button in &self.buttons {
            if button.led.index() >= LED_COUNT {
                return Err(ConfigError::UnknownLed {
                    button: button.label,
                });
            }
        }

        for (i, led) in self.leds.iter().enumerate() {
            let controls = |action: LedAction| {
                self.buttons
                    .iter()
                    .any(|b| b.led.index() == i && b.action == action)
            };
            if !controls(LedAction::ForceOn) {
                return Err(ConfigError::MissingSetButton { led: led.label });
            }
            if !controls(LedAction::ForceOff) {
                return Err(ConfigError::MissingClearButton { led: led.label });
            }
        }

        Ok(())
    }
}
