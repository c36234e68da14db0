//! Stream origins and capture timestamps

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Identifier of one physical byte stream (a serial path, a remote socket address, ...)
///
/// All per-stream state is keyed by origin. Origins never expire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(transparent)]
pub struct Origin(String);

impl Origin {
    /// Create a new origin
    pub fn new(origin: impl Into<String>) -> Self {
        Self(origin.into())
    }

    /// Borrow the origin as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Origin {
    fn from(origin: &str) -> Self {
        Self(origin.to_string())
    }
}

impl From<String> for Origin {
    fn from(origin: String) -> Self {
        Self(origin)
    }
}

impl From<std::net::SocketAddr> for Origin {
    fn from(addr: std::net::SocketAddr) -> Self {
        Self(addr.to_string())
    }
}

/// Capture time in milliseconds since the Unix epoch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from Unix milliseconds
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Current system time
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self(millis)
    }

    /// Unix milliseconds
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Timestamp `duration` earlier, saturating at the epoch
    pub fn saturating_sub(self, duration: Duration) -> Self {
        Self(self.0.saturating_sub(duration.as_millis() as u64))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
