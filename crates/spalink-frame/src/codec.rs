use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::checksum;
use crate::error::{FrameError, Result};
use crate::reassembler::DEFAULT_STALE_AFTER;

/// Start and end delimiter byte.
pub const DELIMITER: u8 = 0x7E;

/// Start-of-frame marker.
pub const START: u8 = DELIMITER;

/// End-of-frame marker.
pub const END: u8 = DELIMITER;

/// Smallest buffer that can hold a start marker and a length byte.
pub const MIN_FRAME_LEN: usize = 2;

/// Largest payload the 1-byte length field can describe (255 - len - checksum).
pub const MAX_PAYLOAD: usize = u8::MAX as usize - 2;

/// A framed controller message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The message payload, without length, checksum or delimiters.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The value of the length byte for this frame.
    pub fn len_byte(&self) -> usize {
        self.payload.len() + 2
    }

    /// The total wire size of this frame (delimiters included).
    pub fn wire_size(&self) -> usize {
        self.len_byte() + 2
    }

    /// Encode this frame into a fresh buffer.
    pub fn encode(&self) -> Result<BytesMut> {
        let mut dst = BytesMut::with_capacity(self.wire_size());
        encode_frame(&self.payload, &mut dst)?;
        Ok(dst)
    }
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────┬─────────┬───────────────────┬──────────┬───────┐
/// │ START │ LEN     │ Payload           │ CRC-8    │ END   │
/// │ 0x7E  │ (1B)    │ (LEN - 2 bytes)   │ (1B)     │ 0x7E  │
/// └───────┴─────────┴───────────────────┴──────────┴───────┘
/// ```
///
/// `LEN` counts itself, the payload and the checksum.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    let len = (payload.len() + 2) as u8;
    dst.reserve(payload.len() + 4);
    dst.put_u8(START);
    dst.put_u8(len);
    dst.put_slice(payload);
    dst.put_u8(checksum(len, payload));
    dst.put_u8(END);
    Ok(())
}

/// Configuration for reading frames off a stream.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// How long a partial frame waits for its continuation. Default: 1s.
    pub stale_after: Duration,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Size of each read from the transport.
    pub read_chunk_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
            read_timeout: None,
            read_chunk_size: 1024,
        }
    }
}
