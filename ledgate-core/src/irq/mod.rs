//! Interrupt registration and dispatch

pub mod table;

pub use table::{map_pin_to_line, EdgeHandler, InterruptTable, IrqReturn};
