//! Edge interrupt abstractions
//!
//! An input pin that can raise interrupts is associated with an interrupt
//! line. The platform arms the line for an edge, detects qualifying edges
//! (after its own debounce), and latches them until the owner of the line
//! collects them with [`IrqPlatform::take_edge`].

use core::fmt;

use crate::gpio::PinId;

/// Interrupt line identifier
///
/// Distinct from the pin number: the platform decides the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqLine(pub u16);

impl fmt::Display for IrqLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "irq{}", self.0)
    }
}

/// Edge that triggers an interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Low to high (button pressed, not released)
    #[default]
    Rising,
    /// High to low
    Falling,
    /// Either transition
    Both,
}

impl Edge {
    /// Check whether a transition from `was_high` to `now_high` qualifies
    pub fn matches(self, was_high: bool, now_high: bool) -> bool {
        match self {
            Edge::Rising => !was_high && now_high,
            Edge::Falling => was_high && !now_high,
            Edge::Both => was_high != now_high,
        }
    }
}

/// Debounced edge detection over sampled input levels
///
/// Platforms that observe pin levels rather than hardware edge latches feed
/// every sample through [`sample`](Self::sample). Each transition is judged
/// against the previous sample, so a change that happened while nothing was
/// waiting on the pin is still reported at the next sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeDetector {
    level: bool,
    last_edge_ms: Option<u64>,
}

impl EdgeDetector {
    /// Start tracking from the pin's current level
    pub const fn new(level: bool) -> Self {
        Self {
            level,
            last_edge_ms: None,
        }
    }

    /// Level seen by the last sample
    pub fn level(&self) -> bool {
        self.level
    }

    /// Record a sample taken at `now_ms`
    ///
    /// Returns `true` if the change from the previous sample qualifies for
    /// `edge` and lies outside the debounce window of the last accepted
    /// edge.
    pub fn sample(&mut self, high: bool, now_ms: u64, edge: Edge, debounce_ms: u32) -> bool {
        let was_high = core::mem::replace(&mut self.level, high);
        if !edge.matches(was_high, high) {
            return false;
        }
        if let Some(last) = self.last_edge_ms {
            if now_ms.saturating_sub(last) < u64::from(debounce_ms) {
                return false;
            }
        }
        self.last_edge_ms = Some(now_ms);
        true
    }
}

/// Errors reported by the interrupt platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqError {
    /// Pin cannot generate interrupts
    NoInterruptCapability,
    /// Line already armed
    Busy,
    /// No free edge-detect resources left
    ResourceExhausted,
}

impl fmt::Display for IrqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            IrqError::NoInterruptCapability => "pin cannot generate interrupts",
            IrqError::Busy => "interrupt line already armed",
            IrqError::ResourceExhausted => "no interrupt resources left",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for IrqError {}

/// Edge interrupt capability
pub trait IrqPlatform {
    /// Map a requested input pin to its interrupt line
    fn pin_to_line(&mut self, pin: PinId) -> Result<IrqLine, IrqError>;

    /// Arm a line for the given edge
    fn enable(&mut self, line: IrqLine, edge: Edge) -> Result<(), IrqError>;

    /// Disarm a line and discard any of its latched edges
    ///
    /// After this returns no edge for `line` is delivered by
    /// [`take_edge`](IrqPlatform::take_edge). No-op when not armed.
    fn disable(&mut self, line: IrqLine);

    /// Collect the oldest latched edge, if any
    ///
    /// Edges are handed out one at a time in arrival order; an edge raised
    /// while the previous one is still being handled stays latched.
    fn take_edge(&mut self) -> Option<IrqLine>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_without_waiter_is_reported_at_next_sample() {
        let mut det = EdgeDetector::new(false);
        // Nothing sampled during the press; the level is still high later
        assert!(det.sample(true, 500, Edge::Rising, 200));
        assert!(det.level());
    }

    #[test]
    fn test_two_lines_changed_before_one_scan_both_report() {
        let mut a = EdgeDetector::new(false);
        let mut b = EdgeDetector::new(false);
        let hits = [
            a.sample(true, 10, Edge::Rising, 200),
            b.sample(true, 10, Edge::Rising, 200),
        ];
        assert_eq!(hits, [true, true]);
    }

    #[test]
    fn test_held_level_does_not_retrigger() {
        let mut det = EdgeDetector::new(false);
        assert!(det.sample(true, 0, Edge::Rising, 0));
        assert!(!det.sample(true, 1000, Edge::Rising, 0));
        assert!(!det.sample(false, 1100, Edge::Rising, 0));
        assert!(det.sample(true, 1200, Edge::Rising, 0));
    }

    #[test]
    fn test_bounce_inside_window_is_swallowed() {
        let mut det = EdgeDetector::new(false);
        assert!(det.sample(true, 0, Edge::Rising, 200));
        assert!(!det.sample(false, 5, Edge::Rising, 200));
        assert!(!det.sample(true, 10, Edge::Rising, 200));
        assert!(!det.sample(false, 150, Edge::Rising, 200));
        assert!(det.sample(true, 250, Edge::Rising, 200));
    }

    #[test]
    fn test_both_edges() {
        let mut det = EdgeDetector::new(true);
        assert!(det.sample(false, 0, Edge::Both, 0));
        assert!(det.sample(true, 1, Edge::Both, 0));
        assert!(!EdgeDetector::new(true).sample(false, 0, Edge::Rising, 0));
    }
}
