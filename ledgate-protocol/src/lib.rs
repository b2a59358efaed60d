//! Ledgate host link protocol
//!
//! UART protocol between the controller and a host. The host can start and
//! stop the controller and query its status; the controller reports presses
//! so the host can run the per-button side action.
//!
//! # Protocol Overview
//!
//! Each message is one frame:
//! ```text
//! ┌──────────────────────────────────────┬───────────┐
//! │ COBS(postcard(message))              │ 0x00      │
//! │ 2–39B, never contains 0x00           │ delimiter │
//! └──────────────────────────────────────┴───────────┘
//! ```
//!
//! The first postcard byte is the message variant. Host commands carry
//! nothing else. Device messages carry the notices in [`notices`].

#![no_std]
#![deny(unsafe_code)]

pub mod frame;
pub mod messages;
pub mod notices;

pub use frame::{
    encode, encode_to_vec, Feed, FrameDecoder, FrameError, FRAME_DELIMITER, MAX_FRAME_SIZE,
};
pub use messages::{DeviceMessage, HostCommand};
pub use notices::{EdgeNotice, FailureCode, LinkState, ReportNotice, StatusNotice};
