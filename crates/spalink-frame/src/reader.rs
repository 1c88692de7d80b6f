use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use bytes::Bytes;
use spalink_transport::SpaStream;
use tracing::debug;

use crate::codec::FrameConfig;
use crate::error::{FrameError, Result};
use crate::outcome::{FrameOutcome, ProcessReport};
use crate::reassembler::{Reassembler, ReassemblerConfig};

/// Reads chunks from any `Read` stream and runs them through a [`Reassembler`].
///
/// One read is one chunk: the staleness window applies between reads exactly
/// as it would for chunks handed to the reassembler directly.
pub struct FrameReader<T> {
    inner: T,
    reassembler: Reassembler,
    chunk: Vec<u8>,
    // Valid payloads from the last chunk not yet handed out by `next_payload`.
    queued: VecDeque<Bytes>,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        let reassembler = Reassembler::with_config(ReassemblerConfig {
            stale_after: config.stale_after,
        });
        Self {
            inner,
            reassembler,
            chunk: vec![0u8; config.read_chunk_size.max(1)],
            queued: VecDeque::new(),
            config,
        }
    }

    /// Perform one read and return everything it produced (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_chunk(&mut self) -> Result<ProcessReport> {
        loop {
            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if self.reassembler.has_pending() {
                    debug!(
                        pending = self.reassembler.pending_len(),
                        "stream closed mid-frame"
                    );
                }
                return Err(FrameError::ConnectionClosed);
            }

            return Ok(self.reassembler.process(&self.chunk[..read]));
        }
    }

    /// Read until a valid frame arrives and return its payload.
    ///
    /// Diagnostics are dropped. When one read carries several valid frames the
    /// extra payloads are queued and returned by the following calls before the
    /// stream is read again.
    pub fn next_payload(&mut self) -> Result<Bytes> {
        loop {
            if let Some(payload) = self.queued.pop_front() {
                return Ok(payload);
            }

            let report = self.read_chunk()?;
            self.queued
                .extend(report.outcomes.into_iter().filter_map(|o| match o {
                    FrameOutcome::Valid(payload) => Some(payload),
                    _ => None,
                }));
        }
    }

    /// Number of payloads waiting to be returned by [`next_payload`](Self::next_payload).
    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    /// Borrow the reassembler, e.g. for its stats.
    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }

    /// Mutably borrow the reassembler.
    pub fn reassembler_mut(&mut self) -> &mut Reassembler {
        &mut self.reassembler
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<SpaStream> {
    /// Create a frame reader for `SpaStream` and apply read timeout from config.
    pub fn with_config_tcp(inner: SpaStream, config: FrameConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}
