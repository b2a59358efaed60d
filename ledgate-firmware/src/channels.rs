//! Inter-task communication channels
//!
//! Defines the static channels used between the link tasks and the
//! controller task.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use ledgate_protocol::{DeviceMessage, HostCommand};

/// Channel capacity for host commands
const COMMAND_CHANNEL_SIZE: usize = 4;

/// Channel capacity for outgoing messages
const OUTBOX_SIZE: usize = 16;

/// Commands parsed from the host link
pub static COMMANDS: Channel<CriticalSectionRawMutex, HostCommand, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Messages waiting to be framed and sent to the host
pub static OUTBOX: Channel<CriticalSectionRawMutex, DeviceMessage, OUTBOX_SIZE> = Channel::new();
