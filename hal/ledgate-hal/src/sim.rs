//! Simulated board
//!
//! A host-side implementation of [`GpioPlatform`] and [`IrqPlatform`] used by
//! the core's tests and for bring-up without hardware. It models a 54-pin
//! GPIO bank (the layout of the Raspberry Pi header this controller was first
//! wired on), a virtual millisecond clock for debounce, an edge latch, and a
//! few fault injection switches.

use heapless::Deque;

use crate::gpio::{GpioError, GpioPlatform, PinId, Role};
use crate::irq::{Edge, EdgeDetector, IrqError, IrqLine, IrqPlatform};

/// Number of GPIOs on the simulated bank (valid pins are 0..54)
pub const SIM_GPIO_COUNT: usize = 54;

/// Interrupt line of GPIO 0; line of pin `n` is `SIM_IRQ_BASE + n`
pub const SIM_IRQ_BASE: u16 = 160;

/// Maximum latched edges before new ones are dropped
pub const SIM_LATCH_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, Default)]
struct SimPin {
    requested: bool,
    role: Option<Role>,
    high: bool,
    exported: bool,
    debounce_ms: u32,
    armed: Option<Edge>,
    detector: EdgeDetector,
    writes: u32,
    // Fault injection, survives free()
    fail_writes: bool,
    no_irq: bool,
}

/// Simulated GPIO bank with edge interrupts
#[derive(Debug, Clone)]
pub struct SimBoard {
    pins: [SimPin; SIM_GPIO_COUNT],
    latched: Deque<IrqLine, SIM_LATCH_DEPTH>,
    now_ms: u64,
    line_limit: usize,
    dropped_edges: u32,
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBoard {
    /// Create a board with every pin free and low
    pub fn new() -> Self {
        Self {
            pins: [SimPin::default(); SIM_GPIO_COUNT],
            latched: Deque::new(),
            now_ms: 0,
            line_limit: SIM_GPIO_COUNT,
            dropped_edges: 0,
        }
    }

    /// Line number the board assigns to a pin
    pub fn line_of(pin: PinId) -> IrqLine {
        IrqLine(SIM_IRQ_BASE.wrapping_add(pin.0 as u16))
    }

    fn pin(&self, pin: PinId) -> Option<&SimPin> {
        pin.index().and_then(|i| self.pins.get(i))
    }

    fn pin_mut(&mut self, pin: PinId) -> Option<&mut SimPin> {
        pin.index().and_then(|i| self.pins.get_mut(i))
    }

    fn requested_mut(&mut self, pin: PinId) -> Result<&mut SimPin, GpioError> {
        match self.pin_mut(pin) {
            None => Err(GpioError::InvalidPin),
            Some(p) if !p.requested => Err(GpioError::NotRequested),
            Some(p) => Ok(p),
        }
    }

    fn pin_of(line: IrqLine) -> PinId {
        PinId(i32::from(line.0) - i32::from(SIM_IRQ_BASE))
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

    // ----- Stimulus -----

    /// Advance the virtual clock
    pub fn advance_ms(&mut self, ms: u64) {
        self.now_ms = self.now_ms.saturating_add(ms);
    }

    /// Current virtual time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Drive the external level of an input pin
    ///
    /// Returns `true` if the transition was latched as an interrupt edge.
    /// A qualifying edge inside the pin's debounce window is swallowed.
    pub fn set_input_level(&mut self, pin: PinId, high: bool) -> bool {
        let now = self.now_ms;
        let Some(p) = self.pin_mut(pin) else {
            return false;
        };
        p.high = high;

        let Some(edge) = p.armed else {
            return false;
        };
        if !p.detector.sample(high, now, edge, p.debounce_ms) {
            return false;
        }

        if self.latched.push_back(Self::line_of(pin)).is_err() {
            self.dropped_edges = self.dropped_edges.saturating_add(1);
            return false;
        }
        true
    }

    /// Press and release a button (low, high, low)
    ///
    /// Returns `true` if either transition latched an edge.
    pub fn press(&mut self, pin: PinId) -> bool {
        let down = self.set_input_level(pin, true);
        let up = self.set_input_level(pin, false);
        down || up
    }

    // ----- Fault injection -----

    /// Make every subsequent `write` to `pin` fail with a hardware fault
    pub fn fail_writes(&mut self, pin: PinId) {
        if let Some(p) = self.pin_mut(pin) {
            p.fail_writes = true;
        }
    }

    /// Make `pin` incapable of generating interrupts
    pub fn deny_interrupts(&mut self, pin: PinId) {
        if let Some(p) = self.pin_mut(pin) {
            p.no_irq = true;
        }
    }

    /// Limit how many lines may be armed at once
    pub fn limit_lines(&mut self, n: usize) {
        self.line_limit = n;
    }

    // ----- Inspection -----

    /// Check if a pin is currently requested
    pub fn is_requested(&self, pin: PinId) -> bool {
        self.pin(pin).is_some_and(|p| p.requested)
    }

    /// Check if a pin is currently exported
    pub fn is_exported(&self, pin: PinId) -> bool {
        self.pin(pin).is_some_and(|p| p.exported)
    }

    /// Direction of a requested pin
    pub fn role(&self, pin: PinId) -> Option<Role> {
        self.pin(pin).and_then(|p| p.role)
    }

    /// Driven level of an output pin
    pub fn output_level(&self, pin: PinId) -> Option<bool> {
        self.pin(pin)
            .filter(|p| p.role == Some(Role::Output))
            .map(|p| p.high)
    }

    /// Debounce interval configured on a pin
    pub fn debounce_ms(&self, pin: PinId) -> u32 {
        self.pin(pin).map_or(0, |p| p.debounce_ms)
    }

    /// Edge a pin's line is armed for
    pub fn armed_edge(&self, pin: PinId) -> Option<Edge> {
        self.pin(pin).and_then(|p| p.armed)
    }

    /// Number of explicit writes to a pin
    pub fn write_count(&self, pin: PinId) -> u32 {
        self.pin(pin).map_or(0, |p| p.writes)
    }

    /// Number of pins currently requested
    pub fn requested_count(&self) -> usize {
        self.pins.iter().filter(|p| p.requested).count()
    }

    /// Number of lines currently armed
    pub fn armed_count(&self) -> usize {
        self.pins.iter().filter(|p| p.armed.is_some()).count()
    }

    /// Number of latched, undelivered edges
    pub fn pending_edges(&self) -> usize {
        self.latched.len()
    }

    /// Number of edges lost to a full latch
    pub fn dropped_edges(&self) -> u32 {
        self.dropped_edges
    }
}

impl GpioPlatform for SimBoard {
    fn is_valid(&self, pin: PinId) -> bool {
        self.pin(pin).is_some()
    }

    fn request(&mut self, pin: PinId) -> Result<(), GpioError> {
        let p = self.pin_mut(pin).ok_or(GpioError::InvalidPin)?;
        if p.requested {
            return Err(GpioError::Busy);
        }
        p.requested = true;
        p.role = None;
        Ok(())
    }

    fn set_output(&mut self, pin: PinId, high: bool) -> Result<(), GpioError> {
        let p = self.requested_mut(pin)?;
        p.role = Some(Role::Output);
        p.high = high;
        Ok(())
    }

    fn set_input(&mut self, pin: PinId) -> Result<(), GpioError> {
        let p = self.requested_mut(pin)?;
        p.role = Some(Role::Input);
        Ok(())
    }

    fn set_debounce(&mut self, pin: PinId, debounce_ms: u32) -> Result<(), GpioError> {
        let p = self.requested_mut(pin)?;
        if p.role != Some(Role::Input) {
            return Err(GpioError::WrongDirection);
        }
        p.debounce_ms = debounce_ms;
        Ok(())
    }

    fn export(&mut self, pin: PinId) -> Result<(), GpioError> {
        let p = self.requested_mut(pin)?;
        p.exported = true;
        Ok(())
    }

    fn unexport(&mut self, pin: PinId) {
        if let Some(p) = self.pin_mut(pin) {
            p.exported = false;
        }
    }

    fn read(&mut self, pin: PinId) -> Result<bool, GpioError> {
        let p = self.requested_mut(pin)?;
        Ok(p.high)
    }

    fn write(&mut self, pin: PinId, high: bool) -> Result<(), GpioError> {
        let p = self.requested_mut(pin)?;
        if p.role != Some(Role::Output) {
            return Err(GpioError::WrongDirection);
        }
        if p.fail_writes {
            return Err(GpioError::Hardware);
        }
        p.high = high;
        p.writes = p.writes.saturating_add(1);
        Ok(())
    }

    fn free(&mut self, pin: PinId) {
        let Some(p) = self.pin_mut(pin) else {
            return;
        };
        let was_armed = p.armed.is_some();
        *p = SimPin {
            high: p.high,
            fail_writes: p.fail_writes,
            no_irq: p.no_irq,
            writes: p.writes,
            ..SimPin::default()
        };
        if was_armed {
            self.purge_line(Self::line_of(pin));
        }
    }
}

impl IrqPlatform for SimBoard {
    fn pin_to_line(&mut self, pin: PinId) -> Result<IrqLine, IrqError> {
        match self.pin(pin) {
            Some(p) if p.requested && p.role == Some(Role::Input) && !p.no_irq => {
                Ok(Self::line_of(pin))
            }
            _ => Err(IrqError::NoInterruptCapability),
        }
    }

    fn enable(&mut self, line: IrqLine, edge: Edge) -> Result<(), IrqError> {
        let armed = self.armed_count();
        let limit = self.line_limit;
        let p = self
            .pin_mut(Self::pin_of(line))
            .filter(|p| p.requested && !p.no_irq)
            .ok_or(IrqError::NoInterruptCapability)?;
        if p.armed.is_some() {
            return Err(IrqError::Busy);
        }
        if armed >= limit {
            return Err(IrqError::ResourceExhausted);
        }
        p.armed = Some(edge);
        p.detector = EdgeDetector::new(p.high);
        Ok(())
    }

    fn disable(&mut self, line: IrqLine) {
        if let Some(p) = self.pin_mut(Self::pin_of(line)) {
            p.armed = None;
        }
        self.purge_line(line);
    }

    fn take_edge(&mut self) -> Option<IrqLine> {
        self.latched.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed_input(board: &mut SimBoard, pin: PinId, debounce_ms: u32) -> IrqLine {
        board.request(pin).unwrap();
        board.set_input(pin).unwrap();
        board.set_debounce(pin, debounce_ms).unwrap();
        let line = board.pin_to_line(pin).unwrap();
        board.enable(line, Edge::Rising).unwrap();
        line
    }

    #[test]
    fn test_request_twice_is_busy() {
        let mut board = SimBoard::new();
        assert!(board.request(PinId(16)).is_ok());
        assert_eq!(board.request(PinId(16)), Err(GpioError::Busy));

        board.free(PinId(16));
        assert!(board.request(PinId(16)).is_ok());
    }

    #[test]
    fn test_invalid_pins() {
        let board = SimBoard::new();
        assert!(!board.is_valid(PinId(-1)));
        assert!(!board.is_valid(PinId(54)));
        assert!(board.is_valid(PinId(0)));
        assert!(board.is_valid(PinId(53)));
    }

    #[test]
    fn test_rising_edge_latched_once_per_press() {
        let mut board = SimBoard::new();
        let line = armed_input(&mut board, PinId(26), 0);

        assert!(board.press(PinId(26)));
        assert_eq!(board.take_edge(), Some(line));
        assert_eq!(board.take_edge(), None);
    }

    #[test]
    fn test_debounce_window_swallows_bounce() {
        let mut board = SimBoard::new();
        let line = armed_input(&mut board, PinId(26), 200);

        assert!(board.press(PinId(26)));
        board.advance_ms(20);
        assert!(!board.press(PinId(26))); // bounce
        board.advance_ms(200);
        assert!(board.press(PinId(26)));

        assert_eq!(board.take_edge(), Some(line));
        assert_eq!(board.take_edge(), Some(line));
        assert_eq!(board.take_edge(), None);
    }

    #[test]
    fn test_disable_discards_latched_edges() {
        let mut board = SimBoard::new();
        let a = armed_input(&mut board, PinId(26), 0);
        let b = armed_input(&mut board, PinId(19), 0);

        board.press(PinId(26));
        board.press(PinId(19));
        board.press(PinId(26));
        board.disable(a);

        assert_eq!(board.take_edge(), Some(b));
        assert_eq!(board.take_edge(), None);
        assert!(!board.press(PinId(26)));
    }

    #[test]
    fn test_line_limit() {
        let mut board = SimBoard::new();
        board.limit_lines(1);
        armed_input(&mut board, PinId(26), 0);

        board.request(PinId(19)).unwrap();
        board.set_input(PinId(19)).unwrap();
        let line = board.pin_to_line(PinId(19)).unwrap();
        assert_eq!(
            board.enable(line, Edge::Rising),
            Err(IrqError::ResourceExhausted)
        );
    }

    #[test]
    fn test_full_latch_counts_dropped_edges() {
        let mut board = SimBoard::new();
        let line = armed_input(&mut board, PinId(26), 0);

        for _ in 0..SIM_LATCH_DEPTH {
            assert!(board.press(PinId(26)));
        }
        assert_eq!(board.dropped_edges(), 0);

        assert!(!board.press(PinId(26)));
        assert!(!board.press(PinId(26)));
        assert_eq!(board.dropped_edges(), 2);
        assert_eq!(board.pending_edges(), SIM_LATCH_DEPTH);

        // Draining makes room again
        assert_eq!(board.take_edge(), Some(line));
        assert!(board.press(PinId(26)));
    }

    #[test]
    fn test_write_fault_injection() {
        let mut board = SimBoard::new();
        board.request(PinId(16)).unwrap();
        board.set_output(PinId(16), false).unwrap();
        board.fail_writes(PinId(16));
        assert_eq!(board.write(PinId(16), true), Err(GpioError::Hardware));
        assert_eq!(board.output_level(PinId(16)), Some(false));
    }
}
