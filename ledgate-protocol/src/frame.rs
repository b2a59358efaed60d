//! Framing for the host link
//!
//! A frame is one postcard-serialized message, COBS-encoded and terminated
//! by a single [`FRAME_DELIMITER`]. COBS keeps the delimiter out of the
//! encoded body, so a receiver that joins mid-stream, or loses bytes, drops
//! at most the frame in progress and picks up again at the next delimiter.

use core::fmt;
use core::marker::PhantomData;

use heapless::Vec;
use postcard::accumulator::{CobsAccumulator, FeedResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Byte that ends every frame
pub const FRAME_DELIMITER: u8 = 0x00;

/// Largest encoded frame, delimiter included
///
/// The biggest message, a stop report with four maximal counters, needs 31.
pub const MAX_FRAME_SIZE: usize = 40;

/// Framing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Message does not fit the output buffer
    Encode,
    /// Frame body is not a valid message
    Decode,
    /// Frame exceeded [`MAX_FRAME_SIZE`] before its delimiter
    Overflow,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FrameError::Encode => "message does not fit the frame buffer",
            FrameError::Decode => "frame does not hold a valid message",
            FrameError::Overflow => "frame longer than the receive buffer",
        })
    }
}

impl core::error::Error for FrameError {}

/// Encode `msg` as a frame into `buf`
///
/// Returns the written part of `buf`, delimiter included.
pub fn encode<'a, T: Serialize>(msg: &T, buf: &'a mut [u8]) -> Result<&'a mut [u8], FrameError> {
    postcard::to_slice_cobs(msg, buf).map_err(|_| FrameError::Encode)
}

/// Encode `msg` as a frame into an owned buffer
pub fn encode_to_vec<T: Serialize>(msg: &T) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
    let mut buf = [0u8; MAX_FRAME_SIZE];
    let frame = encode(msg, &mut buf)?;
    Vec::from_slice(frame).map_err(|_| FrameError::Encode)
}

/// Result of one [`FrameDecoder::feed`] step
#[derive(Debug, PartialEq, Eq)]
pub enum Feed<'a, T> {
    /// Input used up, no delimiter seen yet
    Pending,
    /// A message completed; `rest` has not been fed yet
    Message { msg: T, rest: &'a [u8] },
    /// A frame was discarded; `rest` has not been fed yet
    Dropped { error: FrameError, rest: &'a [u8] },
}

/// Reassembles frames from a byte stream and decodes them as `T`
pub struct FrameDecoder<T> {
    acc: CobsAccumulator<MAX_FRAME_SIZE>,
    _msg: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Default for FrameDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> FrameDecoder<T> {
    pub fn new() -> Self {
        Self {
            acc: CobsAccumulator::new(),
            _msg: PhantomData,
        }
    }

    /// Feed bytes up to and including the next delimiter
    pub fn feed<'a>(&mut self, bytes: &'a [u8]) -> Feed<'a, T> {
        match self.acc.feed::<T>(bytes) {
            FeedResult::Consumed => Feed::Pending,
            FeedResult::OverFull(rest) => Feed::Dropped {
                error: FrameError::Overflow,
                rest,
            },
            FeedResult::DeserError(rest) => Feed::Dropped {
                error: FrameError::Decode,
                rest,
            },
            FeedResult::Success { data, remaining } => Feed::Message {
                msg: data,
                rest: remaining,
            },
        }
    }

    /// Feed a whole buffer, handing every completed frame to `on_frame`
    ///
    /// A trailing partial frame is kept for the next call.
    pub fn feed_all(&mut self, mut bytes: &[u8], mut on_frame: impl FnMut(Result<T, FrameError>)) {
        while !bytes.is_empty() {
            bytes = match self.feed(bytes) {
                Feed::Pending => break,
                Feed::Message { msg, rest } => {
                    on_frame(Ok(msg));
                    rest
                }
                Feed::Dropped { error, rest } => {
                    on_frame(Err(error));
                    rest
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::HostCommand;

    #[test]
    fn test_frame_ends_with_only_delimiter() {
        let frame = encode_to_vec(&(0u32, [0u8; 6])).unwrap();
        let (last, body) = frame.split_last().unwrap();
        assert_eq!(*last, FRAME_DELIMITER);
        assert!(!body.contains(&FRAME_DELIMITER));
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let mut buf = [0u8; 2];
        assert_eq!(
            encode(&[7u32; 4], &mut buf).map(|f| f.len()),
            Err(FrameError::Encode)
        );
    }

    #[test]
    fn test_frame_split_across_reads() {
        let frame = encode_to_vec(&HostCommand::QueryStatus).unwrap();
        let (head, tail) = frame.split_at(1);

        let mut decoder = FrameDecoder::<HostCommand>::new();
        assert_eq!(decoder.feed(head), Feed::Pending);
        assert_eq!(
            decoder.feed(tail),
            Feed::Message {
                msg: HostCommand::QueryStatus,
                rest: &[]
            }
        );
    }

    #[test]
    fn test_resync_after_line_noise() {
        let frame = encode_to_vec(&HostCommand::Stop).unwrap();
        let mut stream = Vec::<u8, 32>::new();
        stream.extend_from_slice(&[0x13, 0x37, 0xFF, FRAME_DELIMITER]).unwrap();
        stream.extend_from_slice(&frame).unwrap();

        let mut decoder = FrameDecoder::<HostCommand>::new();
        let mut seen = Vec::<Result<HostCommand, FrameError>, 4>::new();
        decoder.feed_all(&stream, |r| seen.push(r).unwrap());

        assert_eq!(seen.last(), Some(&Ok(HostCommand::Stop)));
    }

    #[test]
    fn test_oversized_frame_dropped_then_recovers() {
        let mut decoder = FrameDecoder::<HostCommand>::new();
        let noise = [0x55u8; MAX_FRAME_SIZE + 8];
        assert!(matches!(
            decoder.feed(&noise),
            Feed::Dropped {
                error: FrameError::Overflow,
                ..
            } | Feed::Pending
        ));

        let mut seen = Vec::<Result<HostCommand, FrameError>, 4>::new();
        decoder.feed_all(&[FRAME_DELIMITER], |r| seen.push(r).unwrap());
        let frame = encode_to_vec(&HostCommand::Ping).unwrap();
        decoder.feed_all(&frame, |r| seen.push(r).unwrap());

        assert_eq!(seen.last(), Some(&Ok(HostCommand::Ping)));
    }

    #[test]
    fn test_two_frames_in_one_read() {
        let mut stream = Vec::<u8, 16>::new();
        stream
            .extend_from_slice(&encode_to_vec(&HostCommand::Start).unwrap())
            .unwrap();
        stream
            .extend_from_slice(&encode_to_vec(&HostCommand::Ping).unwrap())
            .unwrap();

        let mut decoder = FrameDecoder::<HostCommand>::new();
        let mut seen = Vec::<Result<HostCommand, FrameError>, 4>::new();
        decoder.feed_all(&stream, |r| seen.push(r).unwrap());
        assert_eq!(
            seen.as_slice(),
            &[Ok(HostCommand::Start), Ok(HostCommand::Ping)]
        );
    }
}
