//! Per-button edge handler
//!
//! Each armed button line is bound to one [`ButtonHandler`]. On a press it
//! drives the button's fixed target level onto its LED, counts the press
//! and optionally hands the event to the notifier, in that order.

use ledgate_hal::{GpioPlatform, IrqLine};

use super::{Channels, EdgeEvent, Notifier};
use crate::error::Error;
use crate::irq::{EdgeHandler, IrqReturn};
use crate::pins::PinManager;

/// State lent to a handler for one invocation
pub struct EdgeContext<'a, P, N> {
    pub pins: &'a mut PinManager<P>,
    pub channels: &'a mut Channels,
    pub notifier: &'a mut N,
}

/// Handler for one button line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonHandler {
    button: usize,
}

impl ButtonHandler {
    /// Handler for the button at `button` in the channel array
    pub const fn new(button: usize) -> Self {
        Self { button }
    }

    /// Index of the handled button
    pub fn button(&self) -> usize {
        self.button
    }
}

impl<'a, P: GpioPlatform, N: Notifier> EdgeHandler<EdgeContext<'a, P, N>> for ButtonHandler {
    fn handle_edge(&mut self, line: IrqLine, cx: &mut EdgeContext<'a, P, N>) -> IrqReturn {
        let button = cx.channels.buttons[self.button];
        let led_index = button.led().index();
        let led = cx.channels.leds[led_index];
        let target = button.action().level();

        let Some(led_handle) = led.handle else {
            panic!("{} pressed while {} is not held", button.label(), led.label());
        };

        // Forced assignment; a failed write leaves no safe state to fall back to
        if let Err(error) = cx.pins.write(led_handle, target) {
            let error = Error::HardwareWriteFailure {
                channel: led.label(),
                error,
            };
            panic!("fatal: {}", error);
        }
        cx.channels.leds[led_index].on = target;

        let presses = cx.channels.buttons[self.button].record_press();

        match button.handle.map(|h| cx.pins.read(h)) {
            Some(Ok(level)) => info!(
                "{}: {} ({}) level={} -> {} {}, presses={}",
                line,
                button.label(),
                button.pin(),
                level,
                led.label(),
                if target { "on" } else { "off" },
                presses
            ),
            _ => info!(
                "{}: {} -> {} {}, presses={}",
                line,
                button.label(),
                led.label(),
                if target { "on" } else { "off" },
                presses
            ),
        }

        if button.notifies() {
            cx.notifier.notify(&EdgeEvent {
                button: button.label(),
                button_index: self.button as u8,
                pin: button.pin(),
                line,
                led: led.label(),
                led_index: led_index as u8,
                led_on: target,
                presses,
            });
        }

        IrqReturn::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardConfig;
    use ledgate_hal::sim::SimBoard;
    use ledgate_hal::{PinId, Role};

    #[derive(Default)]
    struct Recorder {
        events: heapless::Vec<EdgeEvent, 8>,
    }

    impl Notifier for Recorder {
        fn notify(&mut self, event: &EdgeEvent) {
            let _ = self.events.push(*event);
        }
    }

    fn setup() -> (PinManager<SimBoard>, Channels) {
        let config = BoardConfig::DEFAULT;
        let mut pins = PinManager::new(SimBoard::new());
        let mut channels = Channels::from_config(&config);
        for led in &mut channels.leds {
            led.handle = Some(pins.acquire(led.pin(), Role::Output).unwrap());
        }
        for button in &mut channels.buttons {
            button.handle = Some(pins.acquire(button.pin(), Role::Input).unwrap());
        }
        (pins, channels)
    }

    #[test]
    fn test_set_and_clear_are_forced() {
        let (mut pins, mut channels) = setup();
        let mut notifier = ();
        let line = IrqLine(186);

        for button in [0, 0, 1, 1, 0] {
            let mut cx = EdgeContext {
                pins: &mut pins,
                channels: &mut channels,
                notifier: &mut notifier,
            };
            assert_eq!(
                ButtonHandler::new(button).handle_edge(line, &mut cx),
                IrqReturn::Handled
            );
            let expected = button == 0;
            assert_eq!(channels.leds[0].is_on(), expected);
            assert_eq!(pins.platform().output_level(PinId(16)), Some(expected));
        }

        assert_eq!(channels.buttons[0].presses(), 3);
        assert_eq!(channels.buttons[1].presses(), 2);
        assert!(!channels.leds[1].is_on());
    }

    #[test]
    fn test_notifier_only_for_flagged_buttons() {
        let (mut pins, mut channels) = setup();
        let mut recorder = Recorder::default();

        for button in 0..4 {
            let mut cx = EdgeContext {
                pins: &mut pins,
                channels: &mut channels,
                notifier: &mut recorder,
            };
            ButtonHandler::new(button).handle_edge(IrqLine(0), &mut cx);
        }

        assert_eq!(recorder.events.len(), 1);
        let event = recorder.events[0];
        assert_eq!(event.button, "A1");
        assert_eq!(event.led, "LED1");
        assert!(event.led_on);
        assert_eq!(event.presses, 1);
    }

    #[test]
    #[should_panic]
    fn test_write_failure_is_fatal() {
        let (mut pins, mut channels) = setup();
        pins.platform_mut().fail_writes(PinId(20));
        let mut notifier = ();
        let mut cx = EdgeContext {
            pins: &mut pins,
            channels: &mut channels,
            notifier: &mut notifier,
        };
        ButtonHandler::new(2).handle_edge(IrqLine(173), &mut cx);
    }
}
