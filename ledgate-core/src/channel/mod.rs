//! LED and button channels
//!
//! A channel is one configured pin plus its runtime state. LED channels
//! mirror the on/off state last written to hardware; button channels carry
//! the interrupt line and the press counter. Both are written only by the
//! edge handler of the owning button line, or by the lifecycle controller
//! while no line is armed.

pub mod handler;

pub use handler::{ButtonHandler, EdgeContext};

use ledgate_hal::{IrqLine, PinId};

use crate::config::{BoardConfig, LedAction, LedId, BUTTON_COUNT, LED_COUNT};
use crate::pins::PinHandle;

/// Output channel driving one LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedChannel {
    label: &'static str,
    pin: PinId,
    pub(crate) handle: Option<PinHandle>,
    pub(crate) on: bool,
}

impl LedChannel {
    /// Name used in logs and reports
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Output pin
    pub fn pin(&self) -> PinId {
        self.pin
    }

    /// Last state written to the LED
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Handle of the acquired pin, while the controller holds it
    pub fn handle(&self) -> Option<PinHandle> {
        self.handle
    }
}

/// Input channel for one button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonChannel {
    label: &'static str,
    pin: PinId,
    led: LedId,
    action: LedAction,
    notify: bool,
    pub(crate) handle: Option<PinHandle>,
    pub(crate) line: Option<IrqLine>,
    presses: u32,
}

impl ButtonChannel {
    /// Name used in logs and reports
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Input pin
    pub fn pin(&self) -> PinId {
        self.pin
    }

    /// LED this button drives
    pub fn led(&self) -> LedId {
        self.led
    }

    /// Fixed effect on the LED
    pub fn action(&self) -> LedAction {
        self.action
    }

    /// Whether presses are passed to the notifier
    pub fn notifies(&self) -> bool {
        self.notify
    }

    /// Handle of the acquired pin, while the controller holds it
    pub fn handle(&self) -> Option<PinHandle> {
        self.handle
    }

    /// Interrupt line, once mapped
    pub fn line(&self) -> Option<IrqLine> {
        self.line
    }

    /// Presses seen since power-up
    pub fn presses(&self) -> u32 {
        self.presses
    }

    /// Count one press, wrapping on overflow
    pub(crate) fn record_press(&mut self) -> u32 {
        self.presses = self.presses.wrapping_add(1);
        self.presses
    }
}

/// All channels of the board
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channels {
    pub leds: [LedChannel; LED_COUNT],
    pub buttons: [ButtonChannel; BUTTON_COUNT],
}

impl Channels {
    /// Build idle channels from the board wiring
    pub fn from_config(config: &BoardConfig) -> Self {
        Self {
            leds: config.leds.map(|l| LedChannel {
                label: l.label,
                pin: l.pin,
                handle: None,
                on: false,
            }),
            buttons: config.buttons.map(|b| ButtonChannel {
                label: b.label,
                pin: b.pin,
                led: b.led,
                action: b.action,
                notify: b.notify,
                handle: None,
                line: None,
                presses: 0,
            }),
        }
    }

    /// Find the button bound to an interrupt line
    pub fn button_for_line(&self, line: IrqLine) -> Option<usize> {
        self.buttons.iter().position(|b| b.line == Some(line))
    }

    /// Forget all pin handles and lines; counters are kept
    pub(crate) fn detach(&mut self) {
        for led in &mut self.leds {
            led.handle = None;
            led.on = false;
        }
        for button in &mut self.buttons {
            button.handle = None;
            button.line = None;
        }
    }
}

/// One handled press, as passed to the [`Notifier`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeEvent {
    pub button: &'static str,
    pub button_index: u8,
    pub pin: PinId,
    pub line: IrqLine,
    pub led: &'static str,
    pub led_index: u8,
    /// LED state after the press
    pub led_on: bool,
    /// Press count after the press
    pub presses: u32,
}

/// External side-action hook
///
/// Called from the edge handler after the LED and counter are updated.
/// Implementations must not block; the handler ignores whatever they do.
pub trait Notifier {
    fn notify(&mut self, event: &EdgeEvent);
}

/// No side action
impl Notifier for () {
    fn notify(&mut self, _event: &EdgeEvent) {}
}

impl<T: Notifier + ?Sized> Notifier for &mut T {
    fn notify(&mut self, event: &EdgeEvent) {
        (**self).notify(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_start_idle() {
        let channels = Channels::from_config(&BoardConfig::DEFAULT);
        assert!(channels.leds.iter().all(|l| !l.is_on() && l.handle().is_none()));
        assert!(channels.buttons.iter().all(|b| b.presses() == 0 && b.line().is_none()));
        assert_eq!(channels.buttons[2].label(), "B1");
        assert_eq!(channels.buttons[2].led(), LedId(1));
    }

    #[test]
    fn test_press_counter_wraps() {
        let mut channels = Channels::from_config(&BoardConfig::DEFAULT);
        channels.buttons[0].presses = u32::MAX;
        assert_eq!(channels.buttons[0].record_press(), 0);
    }

    #[test]
    fn test_detach_keeps_counters() {
        let mut channels = Channels::from_config(&BoardConfig::DEFAULT);
        channels.buttons[1].line = Some(IrqLine(179));
        channels.buttons[1].record_press();
        channels.leds[0].on = true;

        channels.detach();
        assert_eq!(channels.buttons[1].presses(), 1);
        assert_eq!(channels.buttons[1].line(), None);
        assert!(!channels.leds[0].is_on());
    }

    #[test]
    fn test_button_for_line() {
        let mut channels = Channels::from_config(&BoardConfig::DEFAULT);
        channels.buttons[3].line = Some(IrqLine(181));
        assert_eq!(channels.button_for_line(IrqLine(181)), Some(3));
        assert_eq!(channels.button_for_line(IrqLine(186)), None);
    }
}
