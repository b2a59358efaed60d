//! Host link transmit task
//!
//! Frames queued device messages and writes them to the UART.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use ledgate_protocol::{frame, MAX_FRAME_SIZE};

use crate::channels::OUTBOX;

/// Link TX task - sends device messages to the host
#[embassy_executor::task]
pub async fn link_tx_task(mut tx: BufferedUartTx) {
    info!("Link TX task started");

    let mut buf = [0u8; MAX_FRAME_SIZE];

    loop {
        let msg = OUTBOX.receive().await;

        let bytes = match frame::encode(&msg, &mut buf) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to frame {:?}: {:?}", msg, e);
                continue;
            }
        };

        if let Err(e) = tx.write_all(bytes).await {
            warn!("UART write error: {:?}", e);
        }
    }
}
