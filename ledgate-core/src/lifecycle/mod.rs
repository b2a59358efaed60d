//! Controller lifecycle
//!
//! Ordered bring-up, full rollback on failure and ordered teardown of every
//! pin and interrupt line the controller uses.

pub mod controller;
pub mod events;
pub mod state;

pub use controller::{ButtonReport, Controller, StatusSnapshot, StopReport};
pub use events::LifecycleEvent;
pub use state::LifecycleState;
