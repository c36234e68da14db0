//! Reel frame model
//!
//! Every frame on the wire starts with a two-byte marker followed by a
//! type-or-length code. The code byte is byte 0 of the frame; all frame
//! lengths below count from it and exclude the marker.
//!
//! | Code        | Kind               | Length                         |
//! |-------------|--------------------|--------------------------------|
//! | `0x01–0x27` | DetectionReport    | `2 + payload + 2 × receivers`  |
//! | `0x70`      | ChainAnnounce      | 22                             |
//! | `0x78`      | ReceiverTelemetry  | 23                             |
//! | other       | Unrecognized       | -                              |
//!
//! For detection reports the code doubles as the payload length.

use bytes::Bytes;

use super::{Origin, ReceiverId, Timestamp, TransmitterId};

/// Frame-start marker
pub const MARKER: [u8; 2] = [0xAA, 0xAA];

/// Fewest bytes after the marker that can hold any frame
pub const MIN_FRAME_LENGTH: usize = 4;

/// Longest possible frame (a detection with 39 payload bytes and 255 receivers)
pub const MAX_FRAME_LENGTH: usize = 551;

pub const CHAIN_ANNOUNCE_CODE: u8 = 0x70;
pub const CHAIN_ANNOUNCE_LENGTH: usize = 22;

pub const RECEIVER_TELEMETRY_CODE: u8 = 0x78;
pub const RECEIVER_TELEMETRY_LENGTH: usize = 23;

/// Largest payload a detection report can carry (its code is the payload length)
pub const DETECTION_MAX_PAYLOAD_LENGTH: u8 = 39;
pub const DETECTION_OVERHEAD_LENGTH: usize = 2;
pub const DETECTION_BYTES_PER_DECODING: usize = 2;

/// Kind of frame selected by the code byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    DetectionReport,
    ChainAnnounce,
    ReceiverTelemetry,
    Unrecognized,
}

impl FrameKind {
    /// Map a code byte to its frame kind
    pub fn from_code(code: u8) -> Self {
        match code {
            CHAIN_ANNOUNCE_CODE => FrameKind::ChainAnnounce,
            RECEIVER_TELEMETRY_CODE => FrameKind::ReceiverTelemetry,
            1..=DETECTION_MAX_PAYLOAD_LENGTH => FrameKind::DetectionReport,
            _ => FrameKind::Unrecognized,
        }
    }

    /// Length of fixed-size frame kinds
    pub fn fixed_length(self) -> Option<usize> {
        match self {
            FrameKind::ChainAnnounce => Some(CHAIN_ANNOUNCE_LENGTH),
            FrameKind::ReceiverTelemetry => Some(RECEIVER_TELEMETRY_LENGTH),
            FrameKind::DetectionReport | FrameKind::Unrecognized => None,
        }
    }
}

/// Total length of a detection report with the given header fields
pub fn detection_frame_length(payload_length: u8, receiver_count: u8) -> usize {
    DETECTION_OVERHEAD_LENGTH
        + payload_length as usize
        + receiver_count as usize * DETECTION_BYTES_PER_DECODING
}

/// One receiver's decoding of a transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureEntry {
    /// Position of the receiver in the chain, as reported inline
    pub chain_position: u8,
    /// Signal strength in dBm, `None` when the receiver had no reading
    pub signal_strength: Option<i16>,
}

/// A transmission heard by one or more receivers of a reel
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionReport {
    pub origin: Origin,
    pub time: Timestamp,
    pub transmitter: TransmitterId,
    /// Raw radio payload
    pub payload: Bytes,
    /// Strictly increasing in chain position
    pub signature: Vec<SignatureEntry>,
}

/// Periodic announce from a receiver, giving its distance from the chain head
#[derive(Debug, Clone, PartialEq)]
pub struct ChainAnnounce {
    pub origin: Origin,
    pub time: Timestamp,
    /// Hops from the chain head (0 = head, closest to the gateway)
    pub hop_count: u8,
    pub receiver_id: ReceiverId,
    pub nonce: [u8; 16],
}

/// Receiver health counters
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiverTelemetry {
    pub origin: Origin,
    pub time: Timestamp,
    pub chain_position: u8,
    pub receiver_id: ReceiverId,
    pub uptime_seconds: u16,
    pub send_count: u16,
    pub crc_pass: u16,
    pub crc_fail: u16,
    /// Raw signed dBm, no calibration applied; `None` when there was no reading
    pub max_rssi: Option<i8>,
    pub avg_rssi: Option<i8>,
    pub min_rssi: Option<i8>,
    pub max_lqi: u8,
    pub avg_lqi: u8,
    pub min_lqi: u8,
    pub temperature_celsius: f64,
    pub radio_voltage: f64,
    /// Uncalibrated raw byte; the conversion to volts is not known
    pub serial_voltage_raw: u8,
}

/// A successfully decoded reel frame
#[derive(Debug, Clone, PartialEq)]
pub enum ReelFrame {
    DetectionReport(DetectionReport),
    ChainAnnounce(ChainAnnounce),
    ReceiverTelemetry(ReceiverTelemetry),
}

impl ReelFrame {
    pub fn origin(&self) -> &Origin {
        match self {
            ReelFrame::DetectionReport(f) => &f.origin,
            ReelFrame::ChainAnnounce(f) => &f.origin,
            ReelFrame::ReceiverTelemetry(f) => &f.origin,
        }
    }

    pub fn time(&self) -> Timestamp {
        match self {
            ReelFrame::DetectionReport(f) => f.time,
            ReelFrame::ChainAnnounce(f) => f.time,
            ReelFrame::ReceiverTelemetry(f) => f.time,
        }
    }

    pub fn kind(&self) -> FrameKind {
        match self {
            ReelFrame::DetectionReport(_) => FrameKind::DetectionReport,
            ReelFrame::ChainAnnounce(_) => FrameKind::ChainAnnounce,
            ReelFrame::ReceiverTelemetry(_) => FrameKind::ReceiverTelemetry,
        }
    }

    /// Number of bytes this frame occupied on the wire, excluding the marker
    pub fn wire_length(&self) -> usize {
        match self {
            ReelFrame::DetectionReport(f) => {
                DETECTION_OVERHEAD_LENGTH
                    + f.payload.len()
                    + f.signature.len() * DETECTION_BYTES_PER_DECODING
            }
            ReelFrame::ChainAnnounce(_) => CHAIN_ANNOUNCE_LENGTH,
            ReelFrame::ReceiverTelemetry(_) => RECEIVER_TELEMETRY_LENGTH,
        }
    }
}
