//! Receiver and transmitter identities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{GatewayError, Result};

/// reelyActive organisationally unique identifier (36 bits)
///
/// Reelceivers only announce the low 28 bits of their EUI-64; the OUI-36
/// supplies the rest.
pub const REELYACTIVE_OUI36: u64 = 0x0_01bc_5094;

const RECEIVER_SUFFIX_MASK: u32 = 0x0FFF_FFFF;

/// Global identity of a reelceiver (an EUI-64)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReceiverId(u64);

impl ReceiverId {
    /// Derive the identity from the four identity bytes of an announce or
    /// telemetry frame.
    ///
    /// The high nibble of the first byte is not part of the identity: the
    /// low 28 bits follow the OUI-36 to form the EUI-64.
    pub fn from_reel_bytes(bytes: [u8; 4]) -> Self {
        let suffix = u32::from_be_bytes(bytes) & RECEIVER_SUFFIX_MASK;
        Self((REELYACTIVE_OUI36 << 28) | u64::from(suffix))
    }

    /// The EUI-64 as an integer
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReceiverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for ReceiverId {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 16 {
            return Err(GatewayError::parse_error(
                "receiver identifier",
                format!("expected 16 hex characters, got {}", s.len()),
            ));
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|e| GatewayError::parse_error("receiver identifier", e.to_string()))
    }
}

/// Kind of identifier carried by a transmitter or receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum IdentifierType {
    #[serde(rename = "Unknown")]
    Unknown,
    #[serde(rename = "EUI-64")]
    Eui64,
    #[serde(rename = "EUI-48")]
    Eui48,
    #[serde(rename = "RND-48")]
    Rnd48,
    #[serde(rename = "RA-28")]
    Ra28,
}

impl IdentifierType {
    /// Whether this is the `Unknown` type
    pub fn is_unknown(self) -> bool {
        matches!(self, IdentifierType::Unknown)
    }
}

/// Identity of a detected transmitter, as extracted from its radio payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmitterId {
    pub identifier: Option<String>,
    pub identifier_type: IdentifierType,
}

impl TransmitterId {
    pub fn new(identifier: impl Into<String>, identifier_type: IdentifierType) -> Self {
        Self { identifier: Some(identifier.into()), identifier_type }
    }

    /// The "could not extract" result
    pub fn unknown() -> Self {
        Self { identifier: None, identifier_type: IdentifierType::Unknown }
    }

    pub fn is_unknown(&self) -> bool {
        self.identifier_type.is_unknown()
    }
}
