//! Ledgate firmware
//!
//! Embassy-based firmware for an RP2040 board with two LEDs and four
//! buttons. Each LED has a button that forces it on and one that forces it
//! off; presses are counted per button and optionally reported to the host
//! over UART0.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ledgate_core::Controller;
use ledgate_hal_rp2040::{PinBank, PinBankPeripherals, Rp2040Gpio};

mod board;
mod channels;
mod notifier;
mod tasks;

use notifier::LinkNotifier;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// UART buffer sizes
const UART_TX_BUF_SIZE: usize = 128;
const UART_RX_BUF_SIZE: usize = 64;

static TX_BUF: StaticCell<[u8; UART_TX_BUF_SIZE]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; UART_RX_BUF_SIZE]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Ledgate firmware starting...");

    let p = embassy_rp::init(Default::default());
    let (bank_pins, link) = PinBankPeripherals::from_peripherals(p);

    // Host link on GPIO0 (TX) / GPIO1 (RX)
    let tx_buf = TX_BUF.init([0u8; UART_TX_BUF_SIZE]);
    let rx_buf = RX_BUF.init([0u8; UART_RX_BUF_SIZE]);
    let uart = Uart::new_blocking(link.uart0, link.tx, link.rx, UartConfig::default())
        .into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    let gpio = Rp2040Gpio::new(PinBank::new(bank_pins));
    let controller = Controller::new(board::BOARD, gpio, LinkNotifier);
    info!(
        "Board: {} LEDs, {} buttons, {}ms debounce",
        board::BOARD.leds.len(),
        board::BOARD.buttons.len(),
        board::BOARD.debounce_ms
    );

    spawner.spawn(tasks::link_rx_task(rx)).unwrap();
    spawner.spawn(tasks::link_tx_task(tx)).unwrap();
    spawner.spawn(tasks::controller_task(controller)).unwrap();

    info!("All tasks spawned");
}
