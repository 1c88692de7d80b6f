//! Frame reassembly for the spa controller wire protocol.
//!
//! Every message on the wire is framed as:
//! - a `0x7E` start delimiter
//! - a 1-byte length covering itself, the payload and the checksum
//! - the payload
//! - a CRC-8 checksum of length + payload
//! - a `0x7E` end delimiter
//!
//! The controller gives no guarantee that a TCP read lines up with a frame, so
//! [`Reassembler`] carries at most one partial frame between reads and reports
//! each candidate frame as a [`FrameOutcome`].

#[cfg(feature = "async")]
pub mod async_codec;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod outcome;
pub mod reader;
pub mod reassembler;

#[cfg(feature = "async")]
pub use async_codec::SpaCodec;
pub use checksum::{checksum, SPA_CRC_8};
pub use codec::{
    encode_frame, Frame, FrameConfig, DELIMITER, END, MAX_PAYLOAD, MIN_FRAME_LEN, START,
};
pub use error::{FrameError, Result};
pub use outcome::{FrameOutcome, HexBytes, ProcessReport};
pub use reader::FrameReader;
pub use reassembler::{Reassembler, ReassemblerConfig, ReassemblerStats, DEFAULT_STALE_AFTER};
