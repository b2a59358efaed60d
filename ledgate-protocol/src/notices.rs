//! Payloads of device messages
//!
//! Channels are referred to by index in the board configuration, which both
//! ends share. All payloads are postcard-encoded.

use serde::{Deserialize, Serialize};

/// LED channels on the board
pub const LED_SLOTS: usize = 2;

/// Button channels on the board
pub const BUTTON_SLOTS: usize = 4;

/// Press report, one per handled edge on a notifying button
///
/// The host runs the button's side action when it receives this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeNotice {
    pub button: u8,
    pub led: u8,
    pub led_on: bool,
    pub presses: u32,
}

/// Controller lifecycle as seen over the link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    Uninitialized,
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// Reply to a status query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusNotice {
    pub state: LinkState,
    pub leds: [bool; LED_SLOTS],
    pub presses: [u32; BUTTON_SLOTS],
}

/// Final counts sent after a stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportNotice {
    /// Button levels sampled before release
    pub levels: [Option<bool>; BUTTON_SLOTS],
    pub presses: [u32; BUTTON_SLOTS],
}

impl ReportNotice {
    /// Sum of all press counters
    pub fn total_presses(&self) -> u64 {
        self.presses.iter().map(|&p| u64::from(p)).sum()
    }
}

/// Why a start request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FailureCode {
    /// Pin out of the platform's range
    InvalidPin { pin: i32 },
    /// Pin could not be requested, configured or exported
    PinSetup { pin: i32 },
    /// Interrupt line could not be mapped or armed
    Registration { pin: i32 },
    /// Board wiring inconsistent
    Config,
    /// Already running
    AlreadyStarted,
    /// Output write failed
    Hardware,
}
