//! Per-origin stream dispatch
//!
//! The dispatcher owns one [`ReassemblyBuffer`] per origin. Each submission is
//! appended to its origin's buffer, and the decoder is run until it needs more
//! bytes. Decoded frames are returned in wire order.

use std::collections::HashMap;
use tracing::debug;

use crate::decoder::{DecodeOutcome, FrameDecoder, ReassemblyBuffer};
use crate::types::{MARKER, Origin, ReelFrame, Timestamp};

/// Counters kept across all origins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    pub bytes_received: u64,
    pub frames_decoded: u64,
    /// Marker occurrences whose frame could not be decoded
    pub unrecognized: u64,
    /// Bytes dropped because they preceded any marker
    pub bytes_discarded: u64,
}

/// Routes submitted bytes through the reassembly and decode loop
#[derive(Debug, Default)]
pub struct StreamDispatcher {
    decoder: FrameDecoder,
    buffers: HashMap<Origin, ReassemblyBuffer>,
    stats: DispatcherStats,
}

impl StreamDispatcher {
    pub fn new(decoder: FrameDecoder) -> Self {
        Self { decoder, buffers: HashMap::new(), stats: DispatcherStats::default() }
    }

    /// Append `bytes` to `origin`'s stream and decode every complete frame
    ///
    /// All frames decoded from this call carry `time` as their capture time.
    pub fn submit_bytes(&mut self, origin: &Origin, bytes: &[u8], time: Timestamp) -> Vec<ReelFrame> {
        let buffer = self.buffers.entry(origin.clone()).or_default();
        buffer.append(bytes);
        self.stats.bytes_received += bytes.len() as u64;

        let mut frames = Vec::new();
        loop {
            match self.decoder.decode_one(buffer, origin, time) {
                DecodeOutcome::NoMarker => {
                    // The final byte may be the first half of a marker
                    let keep_from = buffer.len().saturating_sub(MARKER.len() - 1);
                    self.stats.bytes_discarded += keep_from as u64;
                    buffer.discard_before(keep_from);
                    break;
                }
                DecodeOutcome::Incomplete { frame_start } => {
                    let marker_start = frame_start - MARKER.len();
                    self.stats.bytes_discarded += marker_start as u64;
                    buffer.discard_before(marker_start);
                    break;
                }
                DecodeOutcome::Unrecognized { resume_at, reason } => {
                    debug!(origin = %origin, %reason, "Skipping unrecognized frame");
                    self.stats.unrecognized += 1;
                    self.stats.bytes_discarded += (resume_at - MARKER.len()) as u64;
                    buffer.discard_before(resume_at);
                }
                DecodeOutcome::Decoded { frame, consumed } => {
                    let marker_start = consumed - frame.wire_length() - MARKER.len();
                    self.stats.bytes_discarded += marker_start as u64;
                    self.stats.frames_decoded += 1;
                    buffer.discard_before(consumed);
                    frames.push(frame);
                }
            }
        }
        frames
    }

    /// Bytes currently buffered for `origin`
    pub fn buffered_len(&self, origin: &Origin) -> usize {
        self.buffers.get(origin).map_or(0, ReassemblyBuffer::len)
    }

    pub fn stats(&self) -> DispatcherStats {
        self.stats
    }

    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }
}
