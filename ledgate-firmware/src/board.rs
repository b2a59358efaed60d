//! Board wiring
//!
//! Generated by the build script from `board.toml`.

use ledgate_core::config::{BoardConfig, ButtonConfig, LedAction, LedConfig, LedId};
use ledgate_hal::{Edge, PinId};

include!(concat!(env!("OUT_DIR"), "/board_config.rs"));
