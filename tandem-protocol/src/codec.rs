//! Wire framing
//!
//! Frames are newline-delimited: one JSON envelope per line. Two codecs
//! share the framing but differ in what they parse:
//!
//! - [`EnvelopeCodec`] (viewer side) decodes frames into typed
//!   [`Envelope`] values. Frames that are not valid JSON are dropped
//!   with a warning and decoding continues with the next frame.
//! - [`FrameCodec`] (relay side) passes frames through as raw bytes.
//!   The relay re-broadcasts what it received verbatim and never
//!   interprets payloads.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::messages::Envelope;

/// Maximum frame size (1 MiB)
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Protocol codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Unknown envelopes cannot be encoded")]
    EncodeUnknown,
}

/// Split the next newline-terminated frame off the buffer.
///
/// Returns the frame without its terminator, with a trailing `\r`
/// stripped. Empty frames are skipped.
fn next_frame(src: &mut BytesMut) -> Result<Option<Bytes>, CodecError> {
    loop {
        let Some(pos) = src.iter().position(|b| *b == b'\n') else {
            if src.len() > MAX_FRAME_SIZE {
                return Err(CodecError::FrameTooLarge {
                    size: src.len(),
                    max: MAX_FRAME_SIZE,
                });
            }
            return Ok(None);
        };

        if pos > MAX_FRAME_SIZE {
            return Err(CodecError::FrameTooLarge {
                size: pos,
                max: MAX_FRAME_SIZE,
            });
        }

        let mut line = src.split_to(pos + 1);
        line.truncate(line.len() - 1);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }

        if line.is_empty() {
            continue;
        }

        return Ok(Some(line.freeze()));
    }
}

/// Codec for typed envelopes, used by viewer clients
pub struct EnvelopeCodec;

impl EnvelopeCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EnvelopeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for EnvelopeCodec {
    type Item = Envelope;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Malformed frames are a peer defect, not a local failure: drop
        // them and keep the stream alive.
        loop {
            let Some(frame) = next_frame(src)? else {
                return Ok(None);
            };

            match serde_json::from_slice::<Envelope>(&frame) {
                Ok(envelope) => return Ok(Some(envelope)),
                Err(e) => {
                    warn!("Dropping malformed frame: {}", e);
                    continue;
                }
            }
        }
    }
}

impl Encoder<Envelope> for EnvelopeCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Envelope, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if matches!(item, Envelope::Unknown) {
            return Err(CodecError::EncodeUnknown);
        }

        let data = serde_json::to_vec(&item)?;
        dst.reserve(data.len() + 1);
        dst.put_slice(&data);
        dst.put_u8(b'\n');
        Ok(())
    }
}

/// Codec for raw frames, used by the relay
pub struct FrameCodec;

impl FrameCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        next_frame(src)
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > MAX_FRAME_SIZE {
            return Err(CodecError::FrameTooLarge {
                size: item.len(),
                max: MAX_FRAME_SIZE,
            });
        }

        dst.reserve(item.len() + 1);
        dst.put_slice(&item);
        dst.put_u8(b'\n');
        Ok(())
    }
}
