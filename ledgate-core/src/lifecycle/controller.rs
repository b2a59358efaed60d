//! Lifecycle controller
//!
//! Owns the pin manager, the interrupt table, the channels and the
//! notifier. Bring-up runs in a fixed order per channel (validate, request,
//! configure, export), then maps and arms every button line. Teardown runs
//! in reverse: lines are disarmed before any pin is touched, so no handler
//! can run against a released pin.

use ledgate_hal::{IrqLine, PinId, Platform, Role};

use super::events::LifecycleEvent;
use super::state::LifecycleState;
use crate::channel::{ButtonHandler, Channels, EdgeContext, Notifier};
use crate::config::{BoardConfig, BUTTON_COUNT, LED_COUNT};
use crate::error::Error;
use crate::irq::{map_pin_to_line, InterruptTable, IrqReturn};
use crate::pins::PinManager;

/// Final state of one button at stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonReport {
    pub label: &'static str,
    pub pin: PinId,
    /// Input level sampled before release; `None` if the pin was not held
    pub level: Option<bool>,
    pub presses: u32,
}

/// Per-button summary returned by [`Controller::stop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StopReport {
    pub buttons: [ButtonReport; BUTTON_COUNT],
}

impl StopReport {
    /// Sum of all press counters
    pub fn total_presses(&self) -> u64 {
        self.buttons.iter().map(|b| u64::from(b.presses)).sum()
    }

    /// Press count of a button by label
    pub fn presses(&self, label: &str) -> Option<u32> {
        self.buttons
            .iter()
            .find(|b| b.label == label)
            .map(|b| b.presses)
    }
}

/// Point-in-time view of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusSnapshot {
    pub state: LifecycleState,
    pub leds: [bool; LED_COUNT],
    pub presses: [u32; BUTTON_COUNT],
}

/// LED/button controller
pub struct Controller<P: Platform, N: Notifier = ()> {
    config: BoardConfig,
    state: LifecycleState,
    pins: PinManager<P>,
    table: InterruptTable<ButtonHandler, BUTTON_COUNT>,
    channels: Channels,
    notifier: N,
}

impl<P: Platform, N: Notifier> Controller<P, N> {
    /// Create an idle controller; nothing is acquired until [`start`](Self::start)
    pub fn new(config: BoardConfig, platform: P, notifier: N) -> Self {
        Self {
            config,
            state: LifecycleState::Uninitialized,
            pins: PinManager::new(platform),
            table: InterruptTable::new(),
            channels: Channels::from_config(&config),
            notifier,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn apply(&mut self, event: LifecycleEvent) {
        let next = self.state.transition(event);
        trace!("lifecycle {} --{}--> {}", self.state, event, next);
        self.state = next;
    }

    /// Acquire every pin and arm every button line
    ///
    /// All or nothing: on any failure everything acquired so far is
    /// released, the controller ends in `Stopped` and the cause is returned.
    /// Calling this while started fails with [`Error::AlreadyStarted`]
    /// without touching hardware.
    pub fn start(&mut self) -> Result<(), Error> {
        if self.state.holds_resources() {
            warn!("start ignored: controller is {}", self.state);
            return Err(Error::AlreadyStarted);
        }

        self.apply(LifecycleEvent::Start);
        info!(
            "starting: {} LEDs, {} buttons, debounce {} ms",
            LED_COUNT,
            BUTTON_COUNT,
            self.config.debounce_ms
        );

        match self.bring_up() {
            Ok(()) => {
                self.apply(LifecycleEvent::StartComplete);
                info!("running");
                Ok(())
            }
            Err(error) => {
                error!("start failed: {}", error);
                self.apply(LifecycleEvent::StartFailed);
                self.teardown();
                self.apply(LifecycleEvent::StopComplete);
                Err(error)
            }
        }
    }

    fn bring_up(&mut self) -> Result<(), Error> {
        self.config.validate()?;

        for led in &mut self.channels.leds {
            let handle = self
                .pins
                .acquire(led.pin(), Role::Output)
                .map_err(|e| Error::pin_setup(led.label(), e))?;
            led.handle = Some(handle);
            led.on = false;
            self.pins
                .export(handle)
                .map_err(|e| Error::pin_setup(led.label(), e))?;
            debug!("{} on {}", led.label(), led.pin());
        }

        for button in &mut self.channels.buttons {
            let handle = self
                .pins
                .acquire(button.pin(), Role::Input)
                .map_err(|e| Error::pin_setup(button.label(), e))?;
            button.handle = Some(handle);
            self.pins
                .configure_input(handle, self.config.debounce_ms, self.config.trigger)
                .map_err(|e| Error::pin_setup(button.label(), e))?;
            self.pins
                .export(handle)
                .map_err(|e| Error::pin_setup(button.label(), e))?;
        }

        for button in &mut self.channels.buttons {
            if let Some(handle) = button.handle {
                match self.pins.read(handle) {
                    Ok(level) => info!("{} level is {}", button.label(), level),
                    Err(e) => warn!("{} level unreadable: {}", button.label(), e),
                }
            }
        }

        for button in &mut self.channels.buttons {
            let line = map_pin_to_line(self.pins.platform_mut(), button.pin()).map_err(|error| {
                Error::RegistrationFailure {
                    channel: button.label(),
                    error,
                }
            })?;
            info!("{} mapped to {}", button.label(), line);
            button.line = Some(line);
        }

        for (index, button) in self.channels.buttons.iter().enumerate() {
            let Some(line) = button.line() else { continue };
            self.table
                .request(
                    self.pins.platform_mut(),
                    line,
                    self.config.trigger,
                    ButtonHandler::new(index),
                )
                .map_err(|error| Error::RegistrationFailure {
                    channel: button.label(),
                    error,
                })?;
            debug!("{} armed on {}", button.label(), line);
        }

        Ok(())
    }

    /// Disarm everything, switch the LEDs off and release every pin
    ///
    /// Safe in any state, including after a failed start or a previous
    /// stop. Press counters survive and keep counting after a restart.
    pub fn stop(&mut self) -> StopReport {
        self.apply(LifecycleEvent::Stop);
        let report = self.teardown();
        self.apply(LifecycleEvent::StopComplete);
        info!("stopped, {} presses total", report.total_presses());
        report
    }

    fn teardown(&mut self) -> StopReport {
        // No handler may run past this point
        self.table.free_all(self.pins.platform_mut());

        for led in &mut self.channels.leds {
            if let Some(handle) = led.handle {
                match self.pins.write(handle, false) {
                    Ok(()) => led.on = false,
                    Err(e) => error!("could not switch {} off: {}", led.label(), e),
                }
            }
        }

        let pins = &mut self.pins;
        let report = StopReport {
            buttons: self.channels.buttons.map(|b| {
                let level = b.handle().and_then(|h| pins.read(h).ok());
                ButtonReport {
                    label: b.label(),
                    pin: b.pin(),
                    level,
                    presses: b.presses(),
                }
            }),
        };
        for button in &report.buttons {
            info!(
                "{} level {}, pressed {} times",
                button.label,
                button.level,
                button.presses
            );
        }

        self.pins.release_all();
        self.channels.detach();
        report
    }

    /// Dispatch one edge on `line`
    ///
    /// Edges outside `Running` are dropped. Returns `None` when the edge was
    /// dropped or no handler is bound to the line.
    pub fn on_edge(&mut self, line: IrqLine) -> Option<IrqReturn> {
        if !self.state.accepts_edges() {
            warn!("{} dropped: controller is {}", line, self.state);
            return None;
        }

        let mut cx = EdgeContext {
            pins: &mut self.pins,
            channels: &mut self.channels,
            notifier: &mut self.notifier,
        };
        let ret = self.table.dispatch(line, &mut cx);
        if ret.is_none() {
            warn!("spurious edge on {}", line);
        }
        ret
    }

    /// Dispatch every edge the platform has latched, oldest first
    ///
    /// Returns the number of edges taken from the platform.
    pub fn service_pending(&mut self) -> usize {
        let mut count = 0;
        while let Some(line) = self.pins.platform_mut().take_edge() {
            self.on_edge(line);
            count += 1;
        }
        count
    }

    /// LED states and press counters
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state,
            leds: self.channels.leds.map(|l| l.is_on()),
            presses: self.channels.buttons.map(|b| b.presses()),
        }
    }

    /// Channel states
    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    /// Board wiring in use
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Pin manager
    pub fn pins(&self) -> &PinManager<P> {
        &self.pins
    }

    /// Underlying platform
    pub fn platform(&self) -> &P {
        self.pins.platform()
    }

    /// Underlying platform, mutably
    ///
    /// Used by the firmware to wait for edges and by tests to inject them.
    pub fn platform_mut(&mut self) -> &mut P {
        self.pins.platform_mut()
    }

    /// Notification hook
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Notification hook, mutably
    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// Number of armed lines
    pub fn armed_lines(&self) -> usize {
        self.table.len()
    }

    /// Stop and hand back the platform and notifier
    pub fn into_parts(mut self) -> (P, N) {
        if self.state.holds_resources() {
            self.stop();
        }
        (self.pins.into_platform(), self.notifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgate_hal::sim::SimBoard;

    fn controller() -> Controller<SimBoard> {
        Controller::new(BoardConfig::DEFAULT, SimBoard::new(), ())
    }

    #[test]
    fn test_start_arms_all_buttons() {
        let mut ctl = controller();
        ctl.start().unwrap();

        assert_eq!(ctl.state(), LifecycleState::Running);
        assert_eq!(ctl.armed_lines(), BUTTON_COUNT);
        assert_eq!(ctl.platform().requested_count(), LED_COUNT + BUTTON_COUNT);
        for button in &BoardConfig::DEFAULT.buttons {
            assert!(ctl.platform().is_exported(button.pin));
            assert_eq!(ctl.platform().debounce_ms(button.pin), 200);
        }
        for led in &BoardConfig::DEFAULT.leds {
            assert_eq!(ctl.platform().output_level(led.pin), Some(false));
        }
    }

    #[test]
    fn test_second_start_rejected() {
        let mut ctl = controller();
        ctl.start().unwrap();
        assert_eq!(ctl.start(), Err(Error::AlreadyStarted));
        assert_eq!(ctl.state(), LifecycleState::Running);
        assert_eq!(ctl.armed_lines(), BUTTON_COUNT);
    }

    #[test]
    fn test_edges_dropped_before_start() {
        let mut ctl = controller();
        assert_eq!(ctl.on_edge(SimBoard::line_of(PinId(26))), None);
        assert_eq!(ctl.status().presses, [0; BUTTON_COUNT]);
    }

    #[test]
    fn test_stop_before_start_is_harmless() {
        let mut ctl = controller();
        let report = ctl.stop();
        assert_eq!(ctl.state(), LifecycleState::Stopped);
        assert!(report.buttons.iter().all(|b| b.level.is_none()));
        assert_eq!(ctl.platform().requested_count(), 0);
    }

    #[test]
    fn test_status_tracks_presses() {
        let mut ctl = controller();
        ctl.start().unwrap();

        ctl.platform_mut().press(PinId(13));
        ctl.service_pending();

        let status = ctl.status();
        assert_eq!(status.state, LifecycleState::Running);
        assert_eq!(status.leds, [false, true]);
        assert_eq!(status.presses, [0, 0, 1, 0]);
    }

    #[test]
    fn test_into_parts_releases_everything() {
        let mut ctl = controller();
        ctl.start().unwrap();
        let (board, ()) = ctl.into_parts();
        assert_eq!(board.requested_count(), 0);
        assert_eq!(board.armed_count(), 0);
    }
}
