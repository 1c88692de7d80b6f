use std::collections::VecDeque;

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::debug;

use crate::error::FrameError;
use crate::outcome::FrameOutcome;
use crate::reassembler::{Reassembler, ReassemblerConfig};

/// `tokio_util` decoder yielding one [`FrameOutcome`] per item.
///
/// Whatever the framed reader has buffered when `decode` runs is handed to the
/// reassembler as a single chunk, so chunk boundaries follow the socket reads.
#[derive(Debug, Default)]
pub struct SpaCodec {
    reassembler: Reassembler,
    queued: VecDeque<FrameOutcome>,
}

impl SpaCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReassemblerConfig) -> Self {
        Self {
            reassembler: Reassembler::with_config(config),
            queued: VecDeque::new(),
        }
    }

    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }
}

impl Decoder for SpaCodec {
    type Item = FrameOutcome;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(outcome) = self.queued.pop_front() {
            return Ok(Some(outcome));
        }
        if src.is_empty() {
            return Ok(None);
        }

        let chunk = src.split();
        let report = self.reassembler.process(&chunk);
        self.queued.extend(report.outcomes);
        Ok(self.queued.pop_front())
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(outcome) = self.decode(buf)? {
            return Ok(Some(outcome));
        }
        if self.reassembler.has_pending() {
            debug!(
                pending = self.reassembler.pending_len(),
                "stream closed mid-frame"
            );
            self.reassembler.reset();
            return Err(FrameError::ConnectionClosed);
        }
        Ok(None)
    }
}
