use std::time::{Duration, Instant};

use bytes::BytesMut;
use tracing::{debug, trace, warn};

use crate::checksum::checksum;
use crate::codec::{END, MIN_FRAME_LEN, START};
use crate::outcome::{FrameOutcome, HexBytes, ProcessReport};

/// Default age after which a buffered partial frame is dropped instead of merged.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_millis(1000);

/// Reassembler tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReassemblerConfig {
    /// A partial frame older than this (inclusive) is discarded on the next chunk.
    pub stale_after: Duration,
}

impl Default for ReassemblerConfig {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

/// Running counters, mostly for diagnostics output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReassemblerStats {
    pub chunks: u64,
    pub valid: u64,
    pub checksum_mismatches: u64,
    pub malformed: u64,
    pub noops: u64,
    pub short_inputs: u64,
    pub partials_buffered: u64,
    pub partials_merged: u64,
    pub partials_discarded: u64,
}

#[derive(Debug)]
struct Pending {
    bytes: BytesMut,
    captured_at: Instant,
}

/// Splits an arriving byte stream into frames.
///
/// Feed it every chunk read from one connection, in order. At most one partial
/// frame is carried between calls; it is merged with the next chunk if that
/// chunk arrives within [`ReassemblerConfig::stale_after`], and dropped otherwise.
///
/// After a bad delimiter or checksum the parser trusts the declared length and
/// skips that many bytes. A corrupted length byte can therefore misalign the
/// rest of its chunk; there is no scan for the next delimiter.
#[derive(Debug, Default)]
pub struct Reassembler {
    config: ReassemblerConfig,
    pending: Option<Pending>,
    stats: ReassemblerStats,
}

impl Reassembler {
    /// Create a reassembler with the default 1s staleness window.
    pub fn new() -> Self {
        Self::with_config(ReassemblerConfig::default())
    }

    pub fn with_config(config: ReassemblerConfig) -> Self {
        Self {
            config,
            pending: None,
            stats: ReassemblerStats::default(),
        }
    }

    /// Process one chunk as it arrives from the transport.
    pub fn process(&mut self, chunk: &[u8]) -> ProcessReport {
        self.process_at(chunk, Instant::now())
    }

    /// Process one chunk, treating `now` as its arrival time.
    pub fn process_at(&mut self, chunk: &[u8], now: Instant) -> ProcessReport {
        self.stats.chunks += 1;
        let mut buf = self.take_pending(chunk, now);
        let mut report = ProcessReport::default();

        while !buf.is_empty() {
            if buf.len() < MIN_FRAME_LEN {
                debug!(bytes = %HexBytes(&buf), "very short input ignored");
                self.stats.short_inputs += 1;
                report
                    .outcomes
                    .push(FrameOutcome::ShortInput { len: buf.len() });
                break;
            }

            let frame_len = buf[1] as usize + 2;
            if buf.len() < frame_len {
                let missing = frame_len - buf.len();
                debug!(
                    bytes = %HexBytes(&buf),
                    missing,
                    "incomplete frame, awaiting more data"
                );
                self.stats.partials_buffered += 1;
                self.pending = Some(Pending {
                    bytes: buf,
                    captured_at: now,
                });
                report.outcomes.push(FrameOutcome::Incomplete { missing });
                break;
            }

            let outcome = self.classify(buf.split_to(frame_len));
            if !matches!(outcome, FrameOutcome::MalformedDelimiter { .. }) {
                report.frames_processed += 1;
            }
            report.outcomes.push(outcome);
        }

        report
    }

    /// Drop any buffered partial frame, e.g. after the connection was replaced.
    pub fn reset(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(len = pending.bytes.len(), "dropping partial frame on reset");
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of bytes held in the pending partial frame.
    pub fn pending_len(&self) -> usize {
        self.pending.as_ref().map_or(0, |p| p.bytes.len())
    }

    pub fn stats(&self) -> &ReassemblerStats {
        &self.stats
    }

    pub fn config(&self) -> &ReassemblerConfig {
        &self.config
    }

    fn take_pending(&mut self, chunk: &[u8], now: Instant) -> BytesMut {
        let Some(pending) = self.pending.take() else {
            return BytesMut::from(chunk);
        };

        let age = now.saturating_duration_since(pending.captured_at);
        if age < self.config.stale_after {
            debug!(
                buffered = pending.bytes.len(),
                incoming = chunk.len(),
                "merging partial frame with new chunk"
            );
            self.stats.partials_merged += 1;
            let mut merged = pending.bytes;
            merged.extend_from_slice(chunk);
            merged
        } else {
            warn!(
                age_ms = age.as_millis() as u64,
                bytes = %HexBytes(&pending.bytes),
                "discarding stale partial frame"
            );
            self.stats.partials_discarded += 1;
            BytesMut::from(chunk)
        }
    }

    /// Classify exactly one candidate frame of `LEN + 2` bytes.
    fn classify(&mut self, frame: BytesMut) -> FrameOutcome {
        let len = frame[1] as usize;
        let start = frame[0];
        let end = frame[len + 1];

        // With LEN == 0 the end offset is the length byte itself.
        if start != START || (len > 0 && end != END) {
            warn!(bytes = %HexBytes(&frame), "frame with bad delimiters");
            self.stats.malformed += 1;
            return FrameOutcome::MalformedDelimiter { start, end };
        }

        if len == 0 {
            trace!("empty frame");
            self.stats.noops += 1;
            return FrameOutcome::NoOp;
        }

        // LEN == 1 leaves no room for payload; the checksum slot is the length byte.
        let payload_end = len.max(2);
        let actual = frame[len];
        let expected = checksum(len as u8, &frame[2..payload_end]);
        if actual != expected {
            warn!(
                expected,
                actual,
                bytes = %HexBytes(&frame),
                "bad checksum"
            );
            self.stats.checksum_mismatches += 1;
            return FrameOutcome::ChecksumMismatch { expected, actual };
        }

        trace!(bytes = %HexBytes(&frame), "valid frame");
        self.stats.valid += 1;
        FrameOutcome::Valid(frame.freeze().slice(2..payload_end))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::codec::{encode_frame, MAX_PAYLOAD};

    const CLEAR_TO_SEND: [u8; 7] = [0x7E, 0x05, 0x10, 0xBF, 0x06, 0x5C, 0x7E];

    fn wire(payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(payload, &mut buf).unwrap();
        buf.to_vec()
    }

    fn valid(payload: &[u8]) -> FrameOutcome {
        FrameOutcome::Valid(Bytes::copy_from_slice(payload))
    }

    #[test]
    fn single_captured_frame() {
        let mut r = Reassembler::new();
        let report = r.process(&CLEAR_TO_SEND);

        assert_eq!(report.outcomes, vec![valid(&[0x10, 0xBF, 0x06])]);
        assert_eq!(report.frames_processed, 1);
        assert!(!r.has_pending());
    }

    #[test]
    fn every_payload_length_in_one_chunk() {
        let mut r = Reassembler::new();
        for size in 0..=MAX_PAYLOAD {
            let payload: Vec<u8> = (0..size).map(|i| i as u8).collect();
            let report = r.process(&wire(&payload));
            assert_eq!(report.outcomes, vec![valid(&payload)], "payload size {size}");
            assert_eq!(report.frames_processed, 1);
        }
    }

    #[test]
    fn split_within_window_matches_whole() {
        let frame = wire(b"\x13\x00\x00\x7E\x20\x05");
        let whole = Reassembler::new().process(&frame);

        for split in MIN_FRAME_LEN..frame.len() {
            let mut r = Reassembler::new();
            let t0 = Instant::now();

            let first = r.process_at(&frame[..split], t0);
            assert_eq!(
                first.outcomes,
                vec![FrameOutcome::Incomplete {
                    missing: frame.len() - split
                }]
            );
            assert_eq!(first.frames_processed, 0);
            assert_eq!(r.pending_len(), split);

            let second = r.process_at(&frame[split..], t0 + Duration::from_millis(20));
            assert_eq!(second, whole, "split at {split}");
            assert!(!r.has_pending());
        }
    }

    #[test]
    fn split_after_first_byte_is_short_input() {
        let mut r = Reassembler::new();
        let report = r.process(&CLEAR_TO_SEND[..1]);

        assert_eq!(report.outcomes, vec![FrameOutcome::ShortInput { len: 1 }]);
        assert_eq!(report.frames_processed, 0);
        assert!(!r.has_pending());

        let rest = r.process(&CLEAR_TO_SEND[1..]);
        assert_eq!(rest.valid_payloads().count(), 0);
    }

    #[test]
    fn stale_partial_is_discarded() {
        let mut r = Reassembler::new();
        let t0 = Instant::now();

        let first = r.process_at(&CLEAR_TO_SEND[..3], t0);
        assert_eq!(first.outcomes, vec![FrameOutcome::Incomplete { missing: 4 }]);

        let second = r.process_at(&CLEAR_TO_SEND[3..], t0 + Duration::from_millis(1500));
        assert_eq!(second.valid_payloads().count(), 0);
        assert_eq!(r.stats().partials_discarded, 1);
        assert_eq!(r.stats().partials_merged, 0);
    }

    #[test]
    fn staleness_boundary_is_inclusive() {
        let t0 = Instant::now();

        let mut merged = Reassembler::new();
        merged.process_at(&CLEAR_TO_SEND[..4], t0);
        let report = merged.process_at(&CLEAR_TO_SEND[4..], t0 + Duration::from_millis(999));
        assert_eq!(report.outcomes, vec![valid(&[0x10, 0xBF, 0x06])]);

        let mut dropped = Reassembler::new();
        dropped.process_at(&CLEAR_TO_SEND[..4], t0);
        let report = dropped.process_at(&CLEAR_TO_SEND[4..], t0 + DEFAULT_STALE_AFTER);
        assert_eq!(report.valid_payloads().count(), 0);
        assert_eq!(dropped.stats().partials_discarded, 1);
    }

    #[test]
    fn fresh_frame_after_stale_partial_parses() {
        let mut r = Reassembler::new();
        let t0 = Instant::now();

        r.process_at(&CLEAR_TO_SEND[..5], t0);
        let report = r.process_at(&CLEAR_TO_SEND, t0 + Duration::from_secs(5));

        assert_eq!(report.outcomes, vec![valid(&[0x10, 0xBF, 0x06])]);
        assert!(!r.has_pending());
    }

    #[test]
    fn custom_staleness_window() {
        let mut r = Reassembler::with_config(ReassemblerConfig {
            stale_after: Duration::from_millis(50),
        });
        let t0 = Instant::now();

        r.process_at(&CLEAR_TO_SEND[..4], t0);
        let report = r.process_at(&CLEAR_TO_SEND[4..], t0 + Duration::from_millis(60));
        assert_eq!(report.valid_payloads().count(), 0);
        assert_eq!(r.config().stale_after, Duration::from_millis(50));
    }

    #[test]
    fn two_frames_in_one_chunk() {
        let mut chunk = wire(b"first");
        chunk.extend_from_slice(&wire(b"second"));

        let report = Reassembler::new().process(&chunk);
        assert_eq!(report.outcomes, vec![valid(b"first"), valid(b"second")]);
        assert_eq!(report.frames_processed, 2);
    }

    #[test]
    fn completion_chunk_carries_next_frame() {
        let mut r = Reassembler::new();
        let t0 = Instant::now();
        let mut tail = CLEAR_TO_SEND[4..].to_vec();
        tail.extend_from_slice(&wire(b"next"));
        tail.extend_from_slice(&CLEAR_TO_SEND[..3]);

        r.process_at(&CLEAR_TO_SEND[..4], t0);
        let report = r.process_at(&tail, t0 + Duration::from_millis(10));

        assert_eq!(
            report.outcomes,
            vec![
                valid(&[0x10, 0xBF, 0x06]),
                valid(b"next"),
                FrameOutcome::Incomplete { missing: 4 },
            ]
        );
        assert_eq!(report.frames_processed, 2);
        assert_eq!(r.pending_len(), 3);
    }

    #[test]
    fn repeated_incomplete_keeps_growing_partial() {
        let mut r = Reassembler::new();
        let t0 = Instant::now();

        r.process_at(&CLEAR_TO_SEND[..2], t0);
        let middle = r.process_at(&CLEAR_TO_SEND[2..4], t0 + Duration::from_millis(900));
        assert_eq!(middle.outcomes, vec![FrameOutcome::Incomplete { missing: 3 }]);

        // The timestamp is refreshed on every re-buffer.
        let last = r.process_at(&CLEAR_TO_SEND[4..], t0 + Duration::from_millis(1800));
        assert_eq!(last.outcomes, vec![valid(&[0x10, 0xBF, 0x06])]);
    }

    #[test]
    fn single_bit_flips_are_detected() {
        let frame = wire(&[0x13, 0x00, 0x45, 0x7E, 0x01]);
        let len = frame[1] as usize;

        for index in 2..=len {
            for bit in 0..8 {
                let mut corrupted = frame.clone();
                corrupted[index] ^= 1 << bit;

                let report = Reassembler::new().process(&corrupted);
                assert_eq!(report.outcomes.len(), 1);
                assert!(
                    matches!(report.outcomes[0], FrameOutcome::ChecksumMismatch { .. }),
                    "byte {index} bit {bit}"
                );
                assert_eq!(report.frames_processed, 1);
            }
        }
    }

    #[test]
    fn bad_start_does_not_stop_chunk() {
        let mut chunk = CLEAR_TO_SEND.to_vec();
        chunk[0] = 0x7F;
        chunk.extend_from_slice(&wire(b"ok"));

        let report = Reassembler::new().process(&chunk);
        assert_eq!(
            report.outcomes,
            vec![
                FrameOutcome::MalformedDelimiter {
                    start: 0x7F,
                    end: 0x7E
                },
                valid(b"ok"),
            ]
        );
        assert_eq!(report.frames_processed, 1);
    }

    #[test]
    fn bad_end_does_not_stop_chunk() {
        let mut chunk = CLEAR_TO_SEND.to_vec();
        chunk[6] = 0x00;
        chunk.extend_from_slice(&CLEAR_TO_SEND);

        let mut r = Reassembler::new();
        let report = r.process(&chunk);
        assert_eq!(
            report.outcomes,
            vec![
                FrameOutcome::MalformedDelimiter {
                    start: 0x7E,
                    end: 0x00
                },
                valid(&[0x10, 0xBF, 0x06]),
            ]
        );
        assert_eq!(r.stats().malformed, 1);
    }

    #[test]
    fn zero_length_frame_is_noop() {
        let mut chunk = vec![0x7E, 0x00];
        chunk.extend_from_slice(&CLEAR_TO_SEND);

        let report = Reassembler::new().process(&chunk);
        assert_eq!(
            report.outcomes,
            vec![FrameOutcome::NoOp, valid(&[0x10, 0xBF, 0x06])]
        );
        assert_eq!(report.frames_processed, 2);
    }

    #[test]
    fn zero_length_without_start_is_malformed() {
        let report = Reassembler::new().process(&[0x00, 0x00]);
        assert_eq!(
            report.outcomes,
            vec![FrameOutcome::MalformedDelimiter {
                start: 0x00,
                end: 0x00
            }]
        );
        assert_eq!(report.frames_processed, 0);
    }

    #[test]
    fn length_one_frame_fails_checksum() {
        let report = Reassembler::new().process(&[0x7E, 0x01, 0x7E]);
        assert_eq!(
            report.outcomes,
            vec![FrameOutcome::ChecksumMismatch {
                expected: checksum(0x01, &[]),
                actual: 0x01
            }]
        );
    }

    #[test]
    fn delimiter_inside_payload_is_data() {
        let payload = [0x7E, 0x7E, 0x00, 0x7E];
        let report = Reassembler::new().process(&wire(&payload));
        assert_eq!(report.outcomes, vec![valid(&payload)]);
    }

    #[test]
    fn trailing_single_byte_is_short_input() {
        let mut chunk = CLEAR_TO_SEND.to_vec();
        chunk.push(0x7E);

        let mut r = Reassembler::new();
        let report = r.process(&chunk);
        assert_eq!(
            report.outcomes,
            vec![
                valid(&[0x10, 0xBF, 0x06]),
                FrameOutcome::ShortInput { len: 1 }
            ]
        );
        assert_eq!(report.frames_processed, 1);
        assert!(!r.has_pending());
    }

    #[test]
    fn reset_drops_pending() {
        let mut r = Reassembler::new();
        r.process(&CLEAR_TO_SEND[..3]);
        assert!(r.has_pending());

        r.reset();
        assert!(!r.has_pending());
        assert_eq!(r.pending_len(), 0);

        let report = r.process(&CLEAR_TO_SEND[3..]);
        assert_eq!(report.valid_payloads().count(), 0);
        assert_eq!(r.stats().partials_merged, 0);
    }

    #[test]
    fn stats_track_every_outcome() {
        let mut r = Reassembler::new();
        let mut chunk = CLEAR_TO_SEND.to_vec();
        chunk.extend_from_slice(&[0x7E, 0x00]);
        let mut bad = CLEAR_TO_SEND.to_vec();
        bad[5] ^= 0xFF;
        chunk.extend_from_slice(&bad);
        chunk.extend_from_slice(&CLEAR_TO_SEND[..2]);

        r.process(&chunk);
        r.process(&CLEAR_TO_SEND[2..]);

        assert_eq!(
            *r.stats(),
            ReassemblerStats {
                chunks: 2,
                valid: 2,
                checksum_mismatches: 1,
                malformed: 0,
                noops: 1,
                short_inputs: 0,
                partials_buffered: 1,
                partials_merged: 1,
                partials_discarded: 0,
            }
        );
    }
}
