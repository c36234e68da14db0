//! Core types for the reel protocol.
//!
//! This module provides the data contract shared by the decoder, the topology
//! manager and consumers:
//! - [`ReelFrame`] and its three variants, produced by the frame decoder
//! - [`FrameKind`] with the code-byte mapping and fixed frame lengths
//! - [`ReceiverId`] / [`TransmitterId`] identities
//! - [`GatewayEvent`] and the detection / infrastructure event shapes
//!
//! ## Usage Example
//!
//! ```rust
//! use reelgate::types::{FrameKind, ReceiverId};
//!
//! assert_eq!(FrameKind::from_code(0x70), FrameKind::ChainAnnounce);
//! assert_eq!(FrameKind::from_code(0x18), FrameKind::DetectionReport);
//!
//! let id = ReceiverId::from_reel_bytes([0x00, 0x80, 0x00, 0x00]);
//! assert_eq!(id.to_string(), "001bc50940800000");
//! ```

mod event;
mod frame;
mod identifier;
mod origin;

// Re-export all public types
pub use event::{
    DetectionEvent, GatewayEvent, InfrastructureEvent, OriginTopology, ReceiverConnected,
    ReceiverDisconnected, ResolvedSignatureEntry, TelemetryReport, TopologySnapshot,
};
pub use frame::{
    CHAIN_ANNOUNCE_CODE, CHAIN_ANNOUNCE_LENGTH, ChainAnnounce, DETECTION_BYTES_PER_DECODING,
    DETECTION_MAX_PAYLOAD_LENGTH, DETECTION_OVERHEAD_LENGTH, DetectionReport, FrameKind, MARKER,
    MAX_FRAME_LENGTH, MIN_FRAME_LENGTH, RECEIVER_TELEMETRY_CODE, RECEIVER_TELEMETRY_LENGTH,
    ReceiverTelemetry, ReelFrame, SignatureEntry, detection_frame_length,
};
pub use identifier::{IdentifierType, REELYACTIVE_OUI36, ReceiverId, TransmitterId};
pub use origin::{Origin, Timestamp};
