//! Message types for the host link
//!
//! Message types are divided into two categories:
//! - Host → Device: lifecycle commands and heartbeat
//! - Device → Host: press notices, status, stop report, heartbeat reply
//!
//! The postcard variant index is the message type on the wire, so new
//! variants go at the end.

use serde::{Deserialize, Serialize};

use crate::notices::{EdgeNotice, FailureCode, ReportNotice, StatusNotice};

/// Commands from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostCommand {
    /// Bring the controller up
    Start,
    /// Tear the controller down and report counts
    Stop,
    /// Report state, LEDs and counters
    QueryStatus,
    /// Heartbeat request
    Ping,
}

/// Messages from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceMessage {
    /// A notifying button was pressed
    Edge(EdgeNotice),
    /// Reply to [`HostCommand::QueryStatus`] and to a successful start
    Status(StatusNotice),
    /// Controller stopped; final counts
    Stopped(ReportNotice),
    /// Start request failed and was rolled back
    StartFailed(FailureCode),
    /// Heartbeat reply
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{encode_to_vec, Feed, FrameDecoder, FrameError, MAX_FRAME_SIZE};
    use crate::notices::LinkState;

    fn decode_one(bytes: &[u8]) -> Result<DeviceMessage, FrameError> {
        match FrameDecoder::<DeviceMessage>::new().feed(bytes) {
            Feed::Message { msg, .. } => Ok(msg),
            Feed::Dropped { error, .. } => Err(error),
            Feed::Pending => Err(FrameError::Decode),
        }
    }

    #[test]
    fn test_commands_are_two_byte_frames() {
        for cmd in [
            HostCommand::Start,
            HostCommand::Stop,
            HostCommand::QueryStatus,
            HostCommand::Ping,
        ] {
            // One tag byte, one COBS overhead byte, the delimiter
            assert_eq!(encode_to_vec(&cmd).unwrap().len(), 3);
        }
    }

    #[test]
    fn test_largest_message_fits_frame() {
        let report = DeviceMessage::Stopped(ReportNotice {
            levels: [Some(true); 4],
            presses: [u32::MAX; 4],
        });
        let frame = encode_to_vec(&report).unwrap();
        assert!(frame.len() <= MAX_FRAME_SIZE);
        assert_eq!(decode_one(&frame), Ok(report));

        let status = DeviceMessage::Status(StatusNotice {
            state: LinkState::Running,
            leds: [true, false],
            presses: [u32::MAX; 4],
        });
        assert_eq!(decode_one(&encode_to_vec(&status).unwrap()), Ok(status));
    }

    #[test]
    fn test_edge_notice_decodes() {
        let msg = DeviceMessage::Edge(EdgeNotice {
            button: 0,
            led: 0,
            led_on: true,
            presses: 300,
        });
        assert_eq!(decode_one(&encode_to_vec(&msg).unwrap()), Ok(msg));
    }

    #[test]
    fn test_truncated_frame_fails_decode() {
        let frame = encode_to_vec(&DeviceMessage::StartFailed(FailureCode::InvalidPin {
            pin: 99,
        }))
        .unwrap();
        let mut short = heapless::Vec::<u8, MAX_FRAME_SIZE>::new();
        short.extend_from_slice(&frame[..2]).unwrap();
        short.push(0).unwrap();
        assert_eq!(decode_one(&short), Err(FrameError::Decode));
    }

    #[test]
    fn test_unknown_command_tag_is_dropped() {
        // Pong's tag is past the last host command
        let frame = encode_to_vec(&DeviceMessage::Pong).unwrap();
        let mut decoder = FrameDecoder::<HostCommand>::new();
        assert_eq!(
            decoder.feed(&frame),
            Feed::Dropped {
                error: FrameError::Decode,
                rest: &[]
            }
        );
    }
}
