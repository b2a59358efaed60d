//! Configuration types
//!
//! The board wiring is fixed at build time; see [`board::BoardConfig`].

pub mod board;

pub use board::{
    BoardConfig, ButtonConfig, LedAction, LedConfig, LedId, BUTTON_COUNT, DEFAULT_DEBOUNCE_MS,
    LED_COUNT,
};
