//! Pin allocation by number
//!
//! Board wiring comes from a config file, so pins are taken by number at
//! runtime instead of by peripheral name. GPIO0 and GPIO1 carry the host
//! link UART and never enter the bank.

use embassy_rp::gpio::AnyPin;
use embassy_rp::peripherals;
use embassy_rp::{Peri, Peripherals};

/// GPIOs on the RP2040
pub const GPIO_COUNT: usize = 30;

/// First GPIO available to the bank
pub const FIRST_BANK_PIN: u8 = 2;

/// Error when taking a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken
    AlreadyTaken,
    /// Pin reserved for the host link
    Reserved,
}

/// Holds the free GPIO pins and hands them out by number
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT],
}

impl PinBank {
    /// Create a bank owning GPIO2..=GPIO29
    pub fn new(p: PinBankPeripherals) -> Self {
        Self {
            pins: [
                None,
                None,
                Some(p.pin2.into()),
                Some(p.pin3.into()),
                Some(p.pin4.into()),
                Some(p.pin5.into()),
                Some(p.pin6.into()),
                Some(p.pin7.into()),
                Some(p.pin8.into()),
                Some(p.pin9.into()),
                Some(p.pin10.into()),
                Some(p.pin11.into()),
                Some(p.pin12.into()),
                Some(p.pin13.into()),
                Some(p.pin14.into()),
                Some(p.pin15.into()),
                Some(p.pin16.into()),
                Some(p.pin17.into()),
                Some(p.pin18.into()),
                Some(p.pin19.into()),
                Some(p.pin20.into()),
                Some(p.pin21.into()),
                Some(p.pin22.into()),
                Some(p.pin23.into()),
                Some(p.pin24.into()),
                Some(p.pin25.into()),
                Some(p.pin26.into()),
                Some(p.pin27.into()),
                Some(p.pin28.into()),
                Some(p.pin29.into()),
            ],
        }
    }

    /// Check if a pin number can ever be taken from the bank
    pub fn is_bank_pin(pin_num: u8) -> bool {
        (FIRST_BANK_PIN..GPIO_COUNT as u8).contains(&pin_num)
    }

    /// Take a pin by number
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        if usize::from(pin_num) >= GPIO_COUNT {
            return Err(PinError::InvalidPin);
        }
        if pin_num < FIRST_BANK_PIN {
            return Err(PinError::Reserved);
        }
        self.pins[usize::from(pin_num)]
            .take()
            .ok_or(PinError::AlreadyTaken)
    }
}

/// GPIO pins moved into the [`PinBank`]
pub struct PinBankPeripherals {
    pub pin2: Peri<'static, peripherals::PIN_2>,
    pub pin3: Peri<'static, peripherals::PIN_3>,
    pub pin4: Peri<'static, peripherals::PIN_4>,
    pub pin5: Peri<'static, peripherals::PIN_5>,
    pub pin6: Peri<'static, peripherals::PIN_6>,
    pub pin7: Peri<'static, peripherals::PIN_7>,
    pub pin8: Peri<'static, peripherals::PIN_8>,
    pub pin9: Peri<'static, peripherals::PIN_9>,
    pub pin10: Peri<'static, peripherals::PIN_10>,
    pub pin11: Peri<'static, peripherals::PIN_11>,
    pub pin12: Peri<'static, peripherals::PIN_12>,
    pub pin13: Peri<'static, peripherals::PIN_13>,
    pub pin14: Peri<'static, peripherals::PIN_14>,
    pub pin15: Peri<'static, peripherals::PIN_15>,
    pub pin16: Peri<'static, peripherals::PIN_16>,
    pub pin17: Peri<'static, peripherals::PIN_17>,
    pub pin18: Peri<'static, peripherals::PIN_18>,
    pub pin19: Peri<'static, peripherals::PIN_19>,
    pub pin20: Peri<'static, peripherals::PIN_20>,
    pub pin21: Peri<'static, peripherals::PIN_21>,
    pub pin22: Peri<'static, peripherals::PIN_22>,
    pub pin23: Peri<'static, peripherals::PIN_23>,
    pub pin24: Peri<'static, peripherals::PIN_24>,
    pub pin25: Peri<'static, peripherals::PIN_25>,
    pub pin26: Peri<'static, peripherals::PIN_26>,
    pub pin27: Peri<'static, peripherals::PIN_27>,
    pub pin28: Peri<'static, peripherals::PIN_28>,
    pub pin29: Peri<'static, peripherals::PIN_29>,
}

/// Peripherals of the host link UART
pub struct LinkPeripherals {
    pub uart0: Peri<'static, peripherals::UART0>,
    pub tx: Peri<'static, peripherals::PIN_0>,
    pub rx: Peri<'static, peripherals::PIN_1>,
}

impl PinBankPeripherals {
    /// Split Embassy peripherals into bank pins and link peripherals
    pub fn from_peripherals(p: Peripherals) -> (Self, LinkPeripherals) {
        let pins = Self {
            pin2: p.PIN_2,
            pin3: p.PIN_3,
            pin4: p.PIN_4,
            pin5: p.PIN_5,
            pin6: p.PIN_6,
            pin7: p.PIN_7,
            pin8: p.PIN_8,
            pin9: p.PIN_9,
            pin10: p.PIN_10,
            pin11: p.PIN_11,
            pin12: p.PIN_12,
            pin13: p.PIN_13,
            pin14: p.PIN_14,
            pin15: p.PIN_15,
            pin16: p.PIN_16,
            pin17: p.PIN_17,
            pin18: p.PIN_18,
            pin19: p.PIN_19,
            pin20: p.PIN_20,
            pin21: p.PIN_21,
            pin22: p.PIN_22,
            pin23: p.PIN_23,
            pin24: p.PIN_24,
            pin25: p.PIN_25,
            pin26: p.PIN_26,
            pin27: p.PIN_27,
            pin28: p.PIN_28,
            pin29: p.PIN_29,
        };
        let link = LinkPeripherals {
            uart0: p.UART0,
            tx: p.PIN_0,
            rx: p.PIN_1,
        };
        (pins, link)
    }
}
