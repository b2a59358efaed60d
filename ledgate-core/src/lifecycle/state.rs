//! Lifecycle state machine

use super::events::LifecycleEvent;

/// Controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleState {
    /// Constructed, nothing acquired
    #[default]
    Uninitialized,
    /// Acquiring pins and registering lines
    Starting,
    /// All lines armed; edges are dispatched
    Running,
    /// Tearing down
    Stopping,
    /// Nothing held; may be started again
    Stopped,
}

impl LifecycleState {
    /// Check if edges are dispatched in this state
    pub fn accepts_edges(&self) -> bool {
        matches!(self, LifecycleState::Running)
    }

    /// Check if pins or lines may be held in this state
    pub fn holds_resources(&self) -> bool {
        matches!(
            self,
            LifecycleState::Starting | LifecycleState::Running | LifecycleState::Stopping
        )
    }

    /// Process an event and return the next state
    pub fn transition(self, event: LifecycleEvent) -> Self {
        use LifecycleEvent::*;
        use LifecycleState::*;

        match (self, event) {
            (Uninitialized, Start) | (Stopped, Start) => Starting,

            (Starting, StartComplete) => Running,
            // Rollback is the same teardown as a stop
            (Starting, StartFailed) => Stopping,

            (Uninitialized, Stop) | (Starting, Stop) | (Running, Stop) | (Stopped, Stop) => {
                Stopping
            }
            (Stopping, StopComplete) => Stopped,

            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_cycle() {
        let state = LifecycleState::default()
            .transition(LifecycleEvent::Start)
            .transition(LifecycleEvent::StartComplete);
        assert_eq!(state, LifecycleState::Running);
        assert!(state.accepts_edges());

        let state = state
            .transition(LifecycleEvent::Stop)
            .transition(LifecycleEvent::StopComplete);
        assert_eq!(state, LifecycleState::Stopped);
        assert!(!state.holds_resources());
    }

    #[test]
    fn test_failed_start_ends_stopped() {
        let state = LifecycleState::Uninitialized
            .transition(LifecycleEvent::Start)
            .transition(LifecycleEvent::StartFailed)
            .transition(LifecycleEvent::StopComplete);
        assert_eq!(state, LifecycleState::Stopped);
    }

    #[test]
    fn test_restart_after_stop() {
        let state = LifecycleState::Stopped.transition(LifecycleEvent::Start);
        assert_eq!(state, LifecycleState::Starting);
    }

    #[test]
    fn test_start_ignored_while_running() {
        assert_eq!(
            LifecycleState::Running.transition(LifecycleEvent::Start),
            LifecycleState::Running
        );
    }

    #[test]
    fn test_stop_accepted_everywhere_but_stopping() {
        for state in [
            LifecycleState::Uninitialized,
            LifecycleState::Starting,
            LifecycleState::Running,
            LifecycleState::Stopped,
        ] {
            assert_eq!(
                state.transition(LifecycleEvent::Stop),
                LifecycleState::Stopping
            );
        }
        assert_eq!(
            LifecycleState::Stopping.transition(LifecycleEvent::Stop),
            LifecycleState::Stopping
        );
    }
}
