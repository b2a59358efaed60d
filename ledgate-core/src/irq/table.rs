//! Interrupt registration table
//!
//! Maps interrupt lines to handler objects. A line has at most one handler.
//!
//! # Serialization
//!
//! [`InterruptTable::dispatch`] takes `&mut self` and runs the handler to
//! completion before returning, so two invocations for the same line can
//! never overlap. Edges raised while a handler runs stay latched in the
//! platform (see [`IrqPlatform::take_edge`]) and are dispatched afterwards,
//! one per edge. Handler state therefore needs no locking as long as only
//! that line's handler writes it.

use heapless::Vec;
use ledgate_hal::{Edge, IrqError, IrqLine, IrqPlatform, PinId};

use crate::error::RegisterError;

/// Acknowledgment returned to the interrupt line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqReturn {
    /// The edge was consumed
    Handled,
    /// The handler did not recognise the edge
    NotHandled,
}

/// Routine bound to an interrupt line
///
/// `Cx` is whatever state the dispatcher lends the handler for the duration
/// of one invocation.
pub trait EdgeHandler<Cx: ?Sized> {
    /// Handle one qualifying edge on `line`
    fn handle_edge(&mut self, line: IrqLine, cx: &mut Cx) -> IrqReturn;
}

#[derive(Debug)]
struct Binding<H> {
    line: IrqLine,
    edge: Edge,
    handler: H,
    invocations: u32,
}

/// Line to handler table with capacity `N`
#[derive(Debug)]
pub struct InterruptTable<H, const N: usize> {
    bindings: Vec<Binding<H>, N>,
}

impl<H, const N: usize> Default for InterruptTable<H, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Map an input pin to its interrupt line
pub fn map_pin_to_line<I: IrqPlatform + ?Sized>(
    irq: &mut I,
    pin: PinId,
) -> Result<IrqLine, RegisterError> {
    irq.pin_to_line(pin)
        .map_err(|_| RegisterError::NoInterruptCapability(pin))
}

impl<H, const N: usize> InterruptTable<H, N> {
    /// Create an empty table
    pub const fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    fn position(&self, line: IrqLine) -> Option<usize> {
        self.bindings.iter().position(|b| b.line == line)
    }

    /// Bind a handler to a line
    ///
    /// Fails without touching the existing binding if the line is already
    /// bound.
    pub fn register(&mut self, line: IrqLine, edge: Edge, handler: H) -> Result<(), RegisterError> {
        if self.is_bound(line) {
            return Err(RegisterError::AlreadyBound(line));
        }

        self.bindings
            .push(Binding {
                line,
                edge,
                handler,
                invocations: 0,
            })
            .map_err(|_| RegisterError::ResourceExhausted(line))
    }

    /// Remove a line's binding and hand back its handler
    pub fn unregister(&mut self, line: IrqLine) -> Option<H> {
        let idx = self.position(line)?;
        Some(self.bindings.remove(idx).handler)
    }

    /// Bind a handler and arm the line on the platform
    ///
    /// If arming fails the binding is removed again.
    pub fn request<I: IrqPlatform + ?Sized>(
        &mut self,
        irq: &mut I,
        line: IrqLine,
        edge: Edge,
        handler: H,
    ) -> Result<(), RegisterError> {
        self.register(line, edge, handler)?;

        if let Err(error) = irq.enable(line, edge) {
            self.unregister(line);
            return Err(match error {
                IrqError::Busy => RegisterError::AlreadyBound(line),
                IrqError::ResourceExhausted => RegisterError::ResourceExhausted(line),
                error => RegisterError::Platform { line, error },
            });
        }
        Ok(())
    }

    /// Disarm a line, then remove its binding
    ///
    /// Once this returns the line's handler cannot run again.
    pub fn free<I: IrqPlatform + ?Sized>(&mut self, irq: &mut I, line: IrqLine) -> Option<H> {
        irq.disable(line);
        self.unregister(line)
    }

    /// Disarm and unbind every line, most recently bound first
    pub fn free_all<I: IrqPlatform + ?Sized>(&mut self, irq: &mut I) {
        while let Some(binding) = self.bindings.pop() {
            irq.disable(binding.line);
        }
    }

    /// Run the handler bound to `line`
    ///
    /// Returns `None` for a line with no handler (spurious edge).
    pub fn dispatch<Cx: ?Sized>(&mut self, line: IrqLine, cx: &mut Cx) -> Option<IrqReturn>
    where
        H: EdgeHandler<Cx>,
    {
        let idx = self.position(line)?;
        let binding = &mut self.bindings[idx];
        binding.invocations = binding.invocations.wrapping_add(1);
        Some(binding.handler.handle_edge(line, cx))
    }

    /// Check if a line has a handler
    pub fn is_bound(&self, line: IrqLine) -> bool {
        self.position(line).is_some()
    }

    /// Edge a bound line triggers on
    pub fn edge(&self, line: IrqLine) -> Option<Edge> {
        self.position(line).map(|idx| self.bindings[idx].edge)
    }

    /// Number of times a line's handler has run
    pub fn invocations(&self, line: IrqLine) -> Option<u32> {
        self.position(line).map(|idx| self.bindings[idx].invocations)
    }

    /// Handler bound to a line
    pub fn handler(&self, line: IrqLine) -> Option<&H> {
        self.position(line).map(|idx| &self.bindings[idx].handler)
    }

    /// Bound lines in registration order
    pub fn lines(&self) -> impl Iterator<Item = IrqLine> + '_ {
        self.bindings.iter().map(|b| b.line)
    }

    /// Number of bound lines
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if no line is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec as HVec;
    use ledgate_hal::sim::SimBoard;
    use ledgate_hal::{GpioPlatform, PinId};

    /// Records which handler ran for which line
    struct Tagged(u8);

    impl EdgeHandler<HVec<(u8, IrqLine), 16>> for Tagged {
        fn handle_edge(&mut self, line: IrqLine, log: &mut HVec<(u8, IrqLine), 16>) -> IrqReturn {
            log.push((self.0, line)).unwrap();
            IrqReturn::Handled
        }
    }

    const LINE_A: IrqLine = IrqLine(186);
    const LINE_B: IrqLine = IrqLine(179);

    #[test]
    fn test_dispatch_reaches_bound_handler() {
        let mut table: InterruptTable<Tagged, 4> = InterruptTable::new();
        table.register(LINE_A, Edge::Rising, Tagged(1)).unwrap();
        table.register(LINE_B, Edge::Rising, Tagged(2)).unwrap();

        let mut log = HVec::new();
        assert_eq!(table.dispatch(LINE_B, &mut log), Some(IrqReturn::Handled));
        assert_eq!(table.dispatch(LINE_A, &mut log), Some(IrqReturn::Handled));
        assert_eq!(&log[..], &[(2, LINE_B), (1, LINE_A)]);
    }

    #[test]
    fn test_double_register_keeps_first_handler() {
        let mut table: InterruptTable<Tagged, 4> = InterruptTable::new();
        table.register(LINE_A, Edge::Rising, Tagged(1)).unwrap();

        assert_eq!(
            table.register(LINE_A, Edge::Rising, Tagged(2)),
            Err(RegisterError::AlreadyBound(LINE_A))
        );

        let mut log = HVec::new();
        table.dispatch(LINE_A, &mut log);
        assert_eq!(&log[..], &[(1, LINE_A)]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_capacity_exhausted() {
        let mut table: InterruptTable<Tagged, 1> = InterruptTable::new();
        table.register(LINE_A, Edge::Rising, Tagged(1)).unwrap();
        assert_eq!(
            table.register(LINE_B, Edge::Rising, Tagged(2)),
            Err(RegisterError::ResourceExhausted(LINE_B))
        );
    }

    #[test]
    fn test_unregistered_line_is_spurious() {
        let mut table: InterruptTable<Tagged, 4> = InterruptTable::new();
        table.register(LINE_A, Edge::Rising, Tagged(1)).unwrap();
        assert_eq!(table.unregister(LINE_A).map(|h| h.0), Some(1));

        let mut log = HVec::new();
        assert_eq!(table.dispatch(LINE_A, &mut log), None);
        assert!(log.is_empty());

        // Rebinding after unregister is allowed
        table.register(LINE_A, Edge::Rising, Tagged(3)).unwrap();
        table.dispatch(LINE_A, &mut log);
        assert_eq!(&log[..], &[(3, LINE_A)]);
    }

    #[test]
    fn test_invocations_are_counted_per_line() {
        let mut table: InterruptTable<Tagged, 4> = InterruptTable::new();
        table.register(LINE_A, Edge::Rising, Tagged(1)).unwrap();
        table.register(LINE_B, Edge::Rising, Tagged(2)).unwrap();

        let mut log = HVec::new();
        for _ in 0..3 {
            table.dispatch(LINE_A, &mut log);
        }
        table.dispatch(LINE_B, &mut log);

        assert_eq!(table.invocations(LINE_A), Some(3));
        assert_eq!(table.invocations(LINE_B), Some(1));
    }

    fn input_line(board: &mut SimBoard, pin: PinId) -> IrqLine {
        board.request(pin).unwrap();
        board.set_input(pin).unwrap();
        map_pin_to_line(board, pin).unwrap()
    }

    #[test]
    fn test_request_arms_platform() {
        let mut board = SimBoard::new();
        let line = input_line(&mut board, PinId(26));

        let mut table: InterruptTable<Tagged, 4> = InterruptTable::new();
        table.request(&mut board, line, Edge::Rising, Tagged(1)).unwrap();
        assert_eq!(board.armed_edge(PinId(26)), Some(Edge::Rising));

        table.free(&mut board, line);
        assert_eq!(board.armed_edge(PinId(26)), None);
        assert!(!table.is_bound(line));
    }

    #[test]
    fn test_request_rolls_back_when_platform_refuses() {
        let mut board = SimBoard::new();
        board.limit_lines(0);
        let line = input_line(&mut board, PinId(26));

        let mut table: InterruptTable<Tagged, 4> = InterruptTable::new();
        assert_eq!(
            table.request(&mut board, line, Edge::Rising, Tagged(1)),
            Err(RegisterError::ResourceExhausted(line))
        );
        assert!(table.is_empty());
    }

    #[test]
    fn test_map_output_pin_has_no_line() {
        let mut board = SimBoard::new();
        board.request(PinId(16)).unwrap();
        board.set_output(PinId(16), false).unwrap();

        assert_eq!(
            map_pin_to_line(&mut board, PinId(16)),
            Err(RegisterError::NoInterruptCapability(PinId(16)))
        );
    }

    #[test]
    fn test_free_all_disarms_everything() {
        let mut board = SimBoard::new();
        let a = input_line(&mut board, PinId(26));
        let b = input_line(&mut board, PinId(19));

        let mut table: InterruptTable<Tagged, 4> = InterruptTable::new();
        table.request(&mut board, a, Edge::Rising, Tagged(1)).unwrap();
        table.request(&mut board, b, Edge::Rising, Tagged(2)).unwrap();
        board.press(PinId(26));

        table.free_all(&mut board);
        assert!(table.is_empty());
        assert_eq!(board.armed_count(), 0);
        assert_eq!(board.take_edge(), None);
    }
}
