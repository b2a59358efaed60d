//! Pin resource management
//!
//! The [`PinManager`] is the only owner of pins in the core. Everything
//! else refers to a pin through a [`PinHandle`].

pub mod input;
pub mod manager;

pub use input::InputConfig;
pub use manager::{PinHandle, PinManager, MAX_PINS};
