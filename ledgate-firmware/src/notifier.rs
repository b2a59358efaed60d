//! Press notifications over the host link
//!
//! The edge handler runs inside the controller task and must not block, so
//! notices are queued with `try_send`. A full outbox drops the notice; the
//! press itself has already been applied and counted.

use defmt::*;
use portable_atomic::{AtomicU32, Ordering};

use ledgate_core::{EdgeEvent, Notifier};
use ledgate_protocol::{DeviceMessage, EdgeNotice};

use crate::channels::OUTBOX;

/// Notices lost to a full outbox
static DROPPED_NOTICES: AtomicU32 = AtomicU32::new(0);

/// Forwards handled presses to the host as [`EdgeNotice`]s
pub struct LinkNotifier;

impl LinkNotifier {
    /// Notices dropped since boot
    pub fn dropped() -> u32 {
        DROPPED_NOTICES.load(Ordering::Relaxed)
    }
}

impl Notifier for LinkNotifier {
    fn notify(&mut self, event: &EdgeEvent) {
        let notice = EdgeNotice {
            button: event.button_index,
            led: event.led_index,
            led_on: event.led_on,
            presses: event.presses,
        };
        if OUTBOX.try_send(DeviceMessage::Edge(notice)).is_err() {
            let dropped = DROPPED_NOTICES.fetch_add(1, Ordering::Relaxed) + 1;
            warn!("Outbox full, dropping press notice for {} ({} dropped)", event.button, dropped);
        }
    }
}
