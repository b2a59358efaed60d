//! Host link receive task
//!
//! Receives frames from the host and queues commands for the controller.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use ledgate_protocol::{FrameDecoder, HostCommand};

use crate::channels::COMMANDS;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

/// Link RX task - receives and decodes frames from the host
#[embassy_executor::task]
pub async fn link_rx_task(mut rx: BufferedUartRx) {
    info!("Link RX task started");

    let mut decoder = FrameDecoder::<HostCommand>::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                decoder.feed_all(&buf[..n], |result| match result {
                    Ok(cmd) => {
                        debug!("Host command: {:?}", cmd);
                        if COMMANDS.try_send(cmd).is_err() {
                            warn!("Command channel full, dropping {:?}", cmd);
                        }
                    }
                    Err(e) => {
                        warn!("Dropped host frame: {:?}", e);
                    }
                });
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}
