//! GPIO and edge delivery on the RP2040
//!
//! Every requested pin is held as a [`Flex`] so its direction can change at
//! runtime. A freed pin is parked as a floating input and keeps its `Flex`,
//! so it can be requested again later.
//!
//! Edges are found by sampling levels. [`Rp2040Gpio::wait_edge`] scans every
//! armed input against its last sampled level through an [`EdgeDetector`],
//! and only when nothing changed does it wait, on a level interrupt for the
//! opposite level. A level interrupt fires immediately if the pin already
//! moved, so a press is still seen when it happened while no waiter existed:
//! during dispatch, during command handling, or while another line won the
//! wake-up. The RP2040 IO bank has no hardware debounce; the detector
//! applies the configured interval by timestamp. Accepted edges go into a
//! latch that the core drains through [`IrqPlatform::take_edge`].

use core::future::pending;

use embassy_futures::select::select4;
use embassy_rp::gpio::{Flex, Level, Pull};
use embassy_time::Instant;
use heapless::Deque;
use ledgate_hal::{
    Edge, EdgeDetector, GpioError, GpioPlatform, IrqError, IrqLine, IrqPlatform, PinId, Role,
};

use crate::pins::{PinBank, PinError, GPIO_COUNT};

/// Lines that can be armed at once
pub const MAX_ARMED_LINES: usize = 4;

/// Accepted edges waiting to be dispatched
const LATCH_DEPTH: usize = 16;

#[derive(Default)]
struct Slot {
    flex: Option<Flex<'static>>,
    requested: bool,
    role: Option<Role>,
    exported: bool,
    debounce_ms: u32,
    armed: Option<Edge>,
    detector: EdgeDetector,
}

impl Slot {
    /// Back to a floating input, keeping the `Flex`
    fn park(&mut self) {
        if let Some(flex) = self.flex.as_mut() {
            flex.set_as_input();
            flex.set_pull(Pull::None);
        }
        *self = Slot {
            flex: self.flex.take(),
            ..Slot::default()
        };
    }

    fn is_high(&self) -> bool {
        self.flex.as_ref().is_some_and(|f| f.is_high())
    }
}

/// Pin and interrupt platform backed by the RP2040 IO bank
pub struct Rp2040Gpio {
    bank: PinBank,
    slots: [Slot; GPIO_COUNT],
    latched: Deque<IrqLine, LATCH_DEPTH>,
    dropped: u32,
}

impl Rp2040Gpio {
    pub fn new(bank: PinBank) -> Self {
        Self {
            bank,
            slots: core::array::from_fn(|_| Slot::default()),
            latched: Deque::new(),
            dropped: 0,
        }
    }

    fn index(&self, pin: PinId) -> Option<usize> {
        let n = u8::try_from(pin.0).ok()?;
        PinBank::is_bank_pin(n).then_some(usize::from(n))
    }

    fn requested(&mut self, pin: PinId) -> Result<&mut Slot, GpioError> {
        let idx = self.index(pin).ok_or(GpioError::InvalidPin)?;
        let slot = &mut self.slots[idx];
        if !slot.requested {
            return Err(GpioError::NotRequested);
        }
        Ok(slot)
    }

    fn flex(slot: &mut Slot) -> Result<&mut Flex<'static>, GpioError> {
        slot.flex.as_mut().ok_or(GpioError::NotRequested)
    }

    fn line_index(&self, line: IrqLine) -> Option<usize> {
        self.index(PinId(i32::from(line.0)))
    }

    fn purge_line(&mut self, line: IrqLine) {
        let mut kept = Deque::new();
        while let Some(l) = self.latched.pop_front() {
            if l != line {
                let _ = kept.push_back(l);
            }
        }
        self.latched = kept;
    }

    /// Number of lines currently armed
    pub fn armed_count(&self) -> usize {
        self.slots.iter().filter(|s| s.armed.is_some()).count()
    }

    /// Edges lost because the latch was full
    pub fn dropped_edges(&self) -> u32 {
        self.dropped
    }

    /// Check if a pin is marked exported
    pub fn is_exported(&self, pin: PinId) -> bool {
        self.index(pin).is_some_and(|i| self.slots[i].exported)
    }

    /// Sample every armed line and latch each qualifying transition
    ///
    /// Returns the first line latched by this scan.
    fn scan(&mut self) -> Option<IrqLine> {
        let now_ms = Instant::now().as_millis();
        let mut first = None;
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            let Some(edge) = slot.armed else {
                continue;
            };
            let high = slot.is_high();
            if !slot.detector.sample(high, now_ms, edge, slot.debounce_ms) {
                continue;
            }
            let line = IrqLine(idx as u16);
            if self.latched.push_back(line).is_err() {
                self.dropped = self.dropped.saturating_add(1);
            }
            first.get_or_insert(line);
        }
        first
    }

    /// Wait until at least one armed line has a qualifying edge outside its
    /// debounce window, latch every such edge and return the first line
    ///
    /// Dropping the returned future loses nothing: level changes are picked
    /// up by the scan at the start of the next call. Never completes while
    /// no line is armed.
    pub async fn wait_edge(&mut self) -> IrqLine {
        loop {
            if let Some(line) = self.scan() {
                return line;
            }

            let mut armed = self.slots.iter_mut().filter_map(|s| {
                s.armed?;
                let level = s.detector.level();
                s.flex.as_mut().map(|flex| (flex, level))
            });
            let a = watch(armed.next());
            let b = watch(armed.next());
            let c = watch(armed.next());
            let d = watch(armed.next());
            select4(a, b, c, d).await;
        }
    }
}

/// Wait until an input leaves the level it was last sampled at
async fn watch(entry: Option<(&mut Flex<'static>, bool)>) {
    let Some((flex, level)) = entry else {
        return pending().await;
    };
    if level {
        flex.wait_for_low().await;
    } else {
        flex.wait_for_high().await;
    }
}

impl GpioPlatform for Rp2040Gpio {
    fn is_valid(&self, pin: PinId) -> bool {
        self.index(pin).is_some()
    }

    fn request(&mut self, pin: PinId) -> Result<(), GpioError> {
        let idx = self.index(pin).ok_or(GpioError::InvalidPin)?;
        if self.slots[idx].requested {
            return Err(GpioError::Busy);
        }
        if self.slots[idx].flex.is_none() {
            let peri = self.bank.take(idx as u8).map_err(|e| match e {
                PinError::AlreadyTaken => GpioError::Busy,
                PinError::InvalidPin | PinError::Reserved => GpioError::InvalidPin,
            })?;
            self.slots[idx].flex = Some(Flex::new(peri));
        }
        self.slots[idx].requested = true;
        Ok(())
    }

    fn set_output(&mut self, pin: PinId, high: bool) -> Result<(), GpioError> {
        let slot = self.requested(pin)?;
        let flex = Self::flex(slot)?;
        flex.set_level(Level::from(high));
        flex.set_as_output();
        slot.role = Some(Role::Output);
        Ok(())
    }

    fn set_input(&mut self, pin: PinId) -> Result<(), GpioError> {
        let slot = self.requested(pin)?;
        let flex = Self::flex(slot)?;
        flex.set_as_input();
        flex.set_pull(Pull::Down);
        slot.role = Some(Role::Input);
        Ok(())
    }

    fn set_debounce(&mut self, pin: PinId, debounce_ms: u32) -> Result<(), GpioError> {
        let slot = self.requested(pin)?;
        if slot.role != Some(Role::Input) {
            return Err(GpioError::WrongDirection);
        }
        slot.debounce_ms = debounce_ms;
        Ok(())
    }

    fn export(&mut self, pin: PinId) -> Result<(), GpioError> {
        self.requested(pin)?.exported = true;
        Ok(())
    }

    fn unexport(&mut self, pin: PinId) {
        if let Ok(slot) = self.requested(pin) {
            slot.exported = false;
        }
    }

    fn read(&mut self, pin: PinId) -> Result<bool, GpioError> {
        let slot = self.requested(pin)?;
        let role = slot.role;
        let flex = Self::flex(slot)?;
        Ok(match role {
            Some(Role::Output) => flex.is_set_high(),
            _ => flex.is_high(),
        })
    }

    fn write(&mut self, pin: PinId, high: bool) -> Result<(), GpioError> {
        let slot = self.requested(pin)?;
        if slot.role != Some(Role::Output) {
            return Err(GpioError::WrongDirection);
        }
        Self::flex(slot)?.set_level(Level::from(high));
        Ok(())
    }

    fn free(&mut self, pin: PinId) {
        let Some(idx) = self.index(pin) else {
            return;
        };
        let was_armed = self.slots[idx].armed.is_some();
        self.slots[idx].park();
        if was_armed {
            self.purge_line(IrqLine(idx as u16));
        }
    }
}

impl IrqPlatform for Rp2040Gpio {
    fn pin_to_line(&mut self, pin: PinId) -> Result<IrqLine, IrqError> {
        let idx = self.index(pin).ok_or(IrqError::NoInterruptCapability)?;
        let slot = &self.slots[idx];
        if !slot.requested || slot.role != Some(Role::Input) {
            return Err(IrqError::NoInterruptCapability);
        }
        // Every bank GPIO has its own edge detector; the line is the pin number
        Ok(IrqLine(idx as u16))
    }

    fn enable(&mut self, line: IrqLine, edge: Edge) -> Result<(), IrqError> {
        let armed = self.armed_count();
        let idx = self
            .line_index(line)
            .ok_or(IrqError::NoInterruptCapability)?;
        let slot = &mut self.slots[idx];
        if !slot.requested {
            return Err(IrqError::NoInterruptCapability);
        }
        if slot.armed.is_some() {
            return Err(IrqError::Busy);
        }
        if armed >= MAX_ARMED_LINES {
            return Err(IrqError::ResourceExhausted);
        }
        slot.armed = Some(edge);
        slot.detector = EdgeDetector::new(slot.is_high());
        Ok(())
    }

    fn disable(&mut self, line: IrqLine) {
        if let Some(idx) = self.line_index(line) {
            self.slots[idx].armed = None;
        }
        self.purge_line(line);
    }

    fn take_edge(&mut self) -> Option<IrqLine> {
        self.latched.pop_front()
    }
}
