//! Append-only reassembly buffer
//!
//! Bytes arrive in arbitrary chunks. The buffer accumulates them and only
//! shrinks when the caller explicitly discards a consumed prefix, so a frame
//! split across chunks is never lost and a consumed frame is never seen twice.

use bytes::{Buf, BytesMut};

const INITIAL_CAPACITY: usize = 4 * 1024;

/// Byte accumulator for one origin
#[derive(Debug, Default)]
pub struct ReassemblyBuffer {
    buffer: BytesMut,
}

impl ReassemblyBuffer {
    pub fn new() -> Self {
        Self { buffer: BytesMut::with_capacity(INITIAL_CAPACITY) }
    }

    /// Concatenate bytes to the tail
    pub fn append(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Offset immediately following the first occurrence of `marker`
    ///
    /// Does not consume anything.
    pub fn find_marker_after(&self, marker: &[u8]) -> Option<usize> {
        if marker.is_empty() || self.buffer.len() < marker.len() {
            return None;
        }
        self.buffer
            .windows(marker.len())
            .position(|window| window == marker)
            .map(|index| index + marker.len())
    }

    /// Drop every byte before `offset`, shifting the retained tail to offset 0
    pub fn discard_before(&mut self, offset: usize) {
        let count = offset.min(self.buffer.len());
        self.buffer.advance(count);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
