//! Ledgate Hardware Abstraction Layer
//!
//! This crate defines the platform capabilities the controller core relies on
//! but does not implement itself: pin multiplexing (request, direction,
//! debounce, export, read/write, free) and edge interrupt delivery. Chip HALs
//! implement these traits; the core is generic over them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (ledgate-firmware, tests)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ledgate-core (lifecycle, dispatch)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ledgate-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ ledgate-hal-  │       │  sim::        │
//! │    rp2040     │       │  SimBoard     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::GpioPlatform`] - Pin request, direction, debounce, export, I/O
//! - [`irq::IrqPlatform`] - Pin-to-line mapping, edge arming, edge delivery
//! - [`Platform`] - Both of the above, which is what the core consumes

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod irq;
pub mod sim;

// Re-export key types at crate root for convenience
pub use gpio::{GpioError, GpioPlatform, PinId, Role};
pub use irq::{Edge, EdgeDetector, IrqError, IrqLine, IrqPlatform};

/// Pin and interrupt capabilities together
///
/// On every supported chip the same peripheral owns GPIO and its edge
/// detection, so the core takes a single platform value.
pub trait Platform: GpioPlatform + IrqPlatform {}

// Blanket implementation for types that implement both traits
impl<T: GpioPlatform + IrqPlatform> Platform for T {}
