//! RP2040-specific HAL for the Ledgate firmware
//!
//! This crate provides RP2040 implementations of the shared `ledgate-hal`
//! traits:
//!
//! - GPIO allocation by pin number ([`pins::PinBank`])
//! - Pin request/direction/export bookkeeping on `Flex` pins
//! - Edge waiting with timestamp debounce and an edge latch

#![no_std]

pub mod gpio;
pub mod pins;

pub use gpio::{Rp2040Gpio, MAX_ARMED_LINES};
pub use pins::{LinkPeripherals, PinBank, PinBankPeripherals};
