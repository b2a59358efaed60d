//! Events that drive lifecycle transitions

/// Lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleEvent {
    /// `start()` called
    Start,
    /// Every channel came up
    StartComplete,
    /// A setup step failed; resources are being rolled back
    StartFailed,
    /// `stop()` called
    Stop,
    /// Teardown finished
    StopComplete,
}
