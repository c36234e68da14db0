//! Provider trait for byte sources

use bytes::Bytes;

use crate::Result;
use crate::types::{Origin, Timestamp};

/// Bytes read from one origin at one moment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReelChunk {
    pub origin: Origin,
    pub bytes: Bytes,
    /// Capture time, stamped by the transport on arrival
    pub time: Timestamp,
}

impl ReelChunk {
    pub fn new(origin: impl Into<Origin>, bytes: impl Into<Bytes>, time: Timestamp) -> Self {
        Self { origin: origin.into(), bytes: bytes.into(), time }
    }
}

/// Trait for reel byte sources
///
/// Providers abstract over transports (UDP, a canned reel, a serial line)
/// and handle their own timing. A provider may deliver bytes for several
/// origins, but the chunks of any one origin must be yielded in arrival
/// order.
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Wait for the next chunk of bytes
    ///
    /// Returns:
    /// - `Ok(Some(chunk))` - Bytes arrived
    /// - `Ok(None)` - Source ended (normal termination)
    /// - `Err(e)` - Read failed; the driver retries with backoff
    async fn next_chunk(&mut self) -> Result<Option<ReelChunk>>;

    /// Short description used in logs
    fn describe(&self) -> String;
}
