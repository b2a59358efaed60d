//! Board-agnostic core logic for the LED/button controller
//!
//! This crate contains all controller logic that does not depend on a
//! specific chip:
//!
//! - Board configuration (which pin is which LED or button)
//! - Pin resource manager with partial-acquire rollback
//! - Debounce and edge configuration of inputs
//! - Interrupt registration table and per-line dispatch
//! - Edge handler: forced LED set/clear plus press counting
//! - Lifecycle controller: ordered start, rollback, ordered stop
//!
//! Hardware access goes through the [`ledgate_hal::Platform`] traits.

#![no_std]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to later modules
#[macro_use]
mod fmt;

pub mod channel;
pub mod config;
pub mod error;
pub mod irq;
pub mod lifecycle;
pub mod pins;

pub use channel::{ButtonChannel, EdgeEvent, LedChannel, Notifier};
pub use config::BoardConfig;
pub use error::Error;
pub use lifecycle::{Controller, LifecycleState, StatusSnapshot, StopReport};
