//! Controller task
//!
//! Owns the lifecycle controller. Starts it at boot, then waits on edges
//! from the IO bank and commands from the host. Edges are dispatched one at
//! a time from this task, so handlers for different buttons never run
//! concurrently against the shared LED state.

use defmt::*;
use embassy_futures::select::{select, Either};

use ledgate_core::error::Error;
use ledgate_core::{Controller, LifecycleState, StatusSnapshot, StopReport};
use ledgate_hal_rp2040::Rp2040Gpio;
use ledgate_protocol::{
    DeviceMessage, FailureCode, HostCommand, LinkState, ReportNotice, StatusNotice,
};

use crate::channels::{COMMANDS, OUTBOX};
use crate::notifier::LinkNotifier;

/// Controller as wired on this board
pub type BoardController = Controller<Rp2040Gpio, LinkNotifier>;

/// Controller task - runs the lifecycle and dispatches edges
#[embassy_executor::task]
pub async fn controller_task(mut controller: BoardController) {
    info!("Controller task started");

    start(&mut controller);

    loop {
        let event = select(controller.platform_mut().wait_edge(), COMMANDS.receive()).await;
        match event {
            Either::First(line) => {
                trace!("Edge on {}", line);
                controller.service_pending();
            }
            Either::Second(cmd) => handle_command(&mut controller, cmd),
        }
    }
}

fn handle_command(controller: &mut BoardController, cmd: HostCommand) {
    match cmd {
        HostCommand::Start => {
            if start(controller) {
                reply(DeviceMessage::Status(status_notice(controller.status())));
            }
        }
        HostCommand::Stop => {
            let report = controller.stop();
            info!(
                "Stopped, {} presses total, {} notices dropped",
                report.total_presses(),
                LinkNotifier::dropped()
            );
            reply(DeviceMessage::Stopped(report_notice(&report)));
        }
        HostCommand::QueryStatus => {
            reply(DeviceMessage::Status(status_notice(controller.status())));
        }
        HostCommand::Ping => {
            trace!("PING received");
            reply(DeviceMessage::Pong);
        }
    }
}

/// Start the controller, reporting a failure to the host
fn start(controller: &mut BoardController) -> bool {
    match controller.start() {
        Ok(()) => {
            info!("Controller running, {} lines armed", controller.armed_lines());
            true
        }
        Err(e) => {
            error!("Start failed: {:?}", e);
            let code = failure_code(controller, &e);
            reply(DeviceMessage::StartFailed(code));
            false
        }
    }
}

fn reply(msg: DeviceMessage) {
    if OUTBOX.try_send(msg).is_err() {
        warn!("Outbox full, dropping {:?}", msg);
    }
}

fn link_state(state: LifecycleState) -> LinkState {
    match state {
        LifecycleState::Uninitialized => LinkState::Uninitialized,
        LifecycleState::Starting => LinkState::Starting,
        LifecycleState::Running => LinkState::Running,
        LifecycleState::Stopping => LinkState::Stopping,
        LifecycleState::Stopped => LinkState::Stopped,
    }
}

fn status_notice(status: StatusSnapshot) -> StatusNotice {
    StatusNotice {
        state: link_state(status.state),
        leds: status.leds,
        presses: status.presses,
    }
}

fn report_notice(report: &StopReport) -> ReportNotice {
    ReportNotice {
        levels: report.buttons.map(|b| b.level),
        presses: report.buttons.map(|b| b.presses),
    }
}

fn failure_code(controller: &BoardController, error: &Error) -> FailureCode {
    match *error {
        Error::InvalidPin { pin, .. } => FailureCode::InvalidPin { pin: pin.0 },
        Error::PinSetup { error, .. } => FailureCode::PinSetup { pin: error.pin().0 },
        Error::RegistrationFailure { channel, .. } => FailureCode::Registration {
            pin: controller
                .config()
                .find_button(channel)
                .map_or(-1, |b| b.pin.0),
        },
        Error::HardwareWriteFailure { .. } => FailureCode::Hardware,
        Error::Config(_) => FailureCode::Config,
        Error::AlreadyStarted => FailureCode::AlreadyStarted,
    }
}
