//! Stateless reel frame decoder
//!
//! Given the contents of a [`ReassemblyBuffer`], locate the first marker and
//! try to decode the frame that follows it. The decoder never fails: it
//! reports that more bytes are needed, that the bytes after the marker are
//! not a frame it understands, or the decoded frame and how far to advance.

use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use super::buffer::ReassemblyBuffer;
use super::identifier::{DefaultIdentifierExtractor, IdentifierExtractor};
use crate::types::{
    CHAIN_ANNOUNCE_LENGTH, ChainAnnounce, DetectionReport, FrameKind, MARKER, MIN_FRAME_LENGTH,
    Origin, RECEIVER_TELEMETRY_LENGTH, ReceiverId, ReceiverTelemetry, ReelFrame, SignatureEntry,
    Timestamp, detection_frame_length,
};

/// Signal strength byte meaning "this receiver has no reading"
pub const NO_READING: u8 = 0x80;

/// How detection signal strength bytes are converted to dBm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RssiMode {
    /// Two's complement with the per-chip calibration selected by payload length
    #[default]
    Calibrated,
    /// Earlier firmware revision: two's complement shifted by 128 into 0-255, uncalibrated
    LegacyWrap,
}

/// Per-chip RSSI calibration
#[derive(Debug, Clone, Copy, PartialEq)]
struct RssiCalibration {
    divisor: f64,
    offset_dbm: f64,
}

// CC1110, reelyActive RFID (4 or 6 byte payloads)
const CC1110: RssiCalibration = RssiCalibration { divisor: 2.0, offset_dbm: -70.0 };
// CC2541, BLE (9 to 39 byte payloads)
const CC2541: RssiCalibration = RssiCalibration { divisor: 1.0, offset_dbm: -100.0 };

fn calibration_for(payload_length: u8) -> Option<RssiCalibration> {
    match payload_length {
        4 | 6 => Some(CC1110),
        9..=39 => Some(CC2541),
        _ => None,
    }
}

/// Round half toward positive infinity (-120.5 rounds to -120)
fn round_half_up(value: f64) -> i16 {
    (value + 0.5).floor() as i16
}

/// Convert a detection signal strength byte to dBm
///
/// Returns `None` for the no-reading sentinel, and for payload lengths with
/// no known calibration.
pub fn decode_signal_strength(raw: u8, payload_length: u8, mode: RssiMode) -> Option<i16> {
    if raw == NO_READING {
        return None;
    }
    let signed = raw as i8;
    match mode {
        RssiMode::Calibrated => {
            let calibration = calibration_for(payload_length)?;
            Some(round_half_up(f64::from(signed) / calibration.divisor + calibration.offset_dbm))
        }
        RssiMode::LegacyWrap => Some(i16::from(signed) + 128),
    }
}

/// Why the bytes following a marker were not decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnrecognizedReason {
    UnknownCode(u8),
    ZeroReceiverCount,
    ChainPositionOrder { previous: u8, current: u8 },
    UnknownTransmitter { payload_length: u8 },
}

impl fmt::Display for UnrecognizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnrecognizedReason::UnknownCode(code) => write!(f, "unknown code {:#04x}", code),
            UnrecognizedReason::ZeroReceiverCount => f.write_str("zero receiver count"),
            UnrecognizedReason::ChainPositionOrder { previous, current } => write!(
                f,
                "chain position {} does not follow {}",
                current, previous
            ),
            UnrecognizedReason::UnknownTransmitter { payload_length } => {
                write!(f, "unknown transmitter in {} byte payload", payload_length)
            }
        }
    }
}

/// Result of one decode attempt
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// No marker in the buffer
    NoMarker,
    /// A marker was found but the frame after it is not complete yet
    Incomplete {
        /// Offset of the code byte (just past the marker)
        frame_start: usize,
    },
    /// The bytes after the marker are not a valid frame
    Unrecognized {
        /// Offset just past the marker; scanning resumes here
        resume_at: usize,
        reason: UnrecognizedReason,
    },
    /// A complete frame
    Decoded {
        frame: ReelFrame,
        /// Offset just past the end of the frame
        consumed: usize,
    },
}

enum FrameOutcome {
    Incomplete,
    Unrecognized(UnrecognizedReason),
    Decoded(ReelFrame),
}

/// Decoder settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderOptions {
    pub rssi_mode: RssiMode,
}

/// Stateless frame decoder
///
/// Holds only configuration: the RSSI conversion and the identifier
/// extraction capability.
#[derive(Clone)]
pub struct FrameDecoder {
    options: DecoderOptions,
    extractor: Arc<dyn IdentifierExtractor>,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DecoderOptions::default())
    }
}

impl fmt::Debug for FrameDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameDecoder").field("options", &self.options).finish_non_exhaustive()
    }
}

impl FrameDecoder {
    /// Create a decoder using the default identifier extractor
    pub fn new(options: DecoderOptions) -> Self {
        Self { options, extractor: Arc::new(DefaultIdentifierExtractor) }
    }

    /// Create a decoder with a custom identifier extractor
    pub fn with_extractor(options: DecoderOptions, extractor: Arc<dyn IdentifierExtractor>) -> Self {
        Self { options, extractor }
    }

    pub fn options(&self) -> DecoderOptions {
        self.options
    }

    /// Attempt to decode the first frame in `buffer`
    pub fn decode_one(
        &self,
        buffer: &ReassemblyBuffer,
        origin: &Origin,
        time: Timestamp,
    ) -> DecodeOutcome {
        let Some(frame_start) = buffer.find_marker_after(&MARKER) else {
            return DecodeOutcome::NoMarker;
        };

        let data = &buffer.as_slice()[frame_start..];
        if data.len() < MIN_FRAME_LENGTH {
            return DecodeOutcome::Incomplete { frame_start };
        }

        match self.decode_frame(data, origin, time) {
            FrameOutcome::Incomplete => DecodeOutcome::Incomplete { frame_start },
            FrameOutcome::Unrecognized(reason) => {
                DecodeOutcome::Unrecognized { resume_at: frame_start, reason }
            }
            FrameOutcome::Decoded(frame) => {
                let consumed = frame_start + frame.wire_length();
                trace!(origin = %origin, kind = ?frame.kind(), consumed, "Decoded frame");
                DecodeOutcome::Decoded { frame, consumed }
            }
        }
    }

    /// Decode the frame starting at its code byte
    fn decode_frame(&self, data: &[u8], origin: &Origin, time: Timestamp) -> FrameOutcome {
        let code = data[0];
        match FrameKind::from_code(code) {
            FrameKind::DetectionReport => self.decode_detection(data, origin, time),
            FrameKind::ChainAnnounce => decode_chain_announce(data, origin, time),
            FrameKind::ReceiverTelemetry => decode_receiver_telemetry(data, origin, time),
            FrameKind::Unrecognized => {
                FrameOutcome::Unrecognized(UnrecognizedReason::UnknownCode(code))
            }
        }
    }

    fn decode_detection(&self, data: &[u8], origin: &Origin, time: Timestamp) -> FrameOutcome {
        let payload_length = data[0];
        let receiver_count = data[1];

        // A frame claiming no receivers is a protocol violation whatever follows
        if receiver_count == 0 {
            return FrameOutcome::Unrecognized(UnrecognizedReason::ZeroReceiverCount);
        }

        let length = detection_frame_length(payload_length, receiver_count);
        if data.len() < length {
            return FrameOutcome::Incomplete;
        }

        let payload_end = 2 + payload_length as usize;
        let payload = &data[2..payload_end];

        let mut signature = Vec::with_capacity(receiver_count as usize);
        let mut previous: Option<u8> = None;
        for pair in data[payload_end..length].chunks_exact(2) {
            let chain_position = pair[0];
            if let Some(previous) = previous {
                if chain_position <= previous {
                    return FrameOutcome::Unrecognized(UnrecognizedReason::ChainPositionOrder {
                        previous,
                        current: chain_position,
                    });
                }
            }
            previous = Some(chain_position);

            let signal_strength =
                decode_signal_strength(pair[1], payload_length, self.options.rssi_mode);
            signature.push(SignatureEntry { chain_position, signal_strength });
        }

        let transmitter = self.extractor.extract(payload, payload_length);
        if transmitter.is_unknown() {
            return FrameOutcome::Unrecognized(UnrecognizedReason::UnknownTransmitter {
                payload_length,
            });
        }

        FrameOutcome::Decoded(ReelFrame::DetectionReport(DetectionReport {
            origin: origin.clone(),
            time,
            transmitter,
            payload: Bytes::copy_from_slice(payload),
            signature,
        }))
    }
}

fn receiver_id_at(data: &[u8], offset: usize) -> ReceiverId {
    ReceiverId::from_reel_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

/// Uncalibrated signed dBm, `None` for the no-reading sentinel
fn raw_rssi_at(data: &[u8], offset: usize) -> Option<i8> {
    match data[offset] {
        NO_READING => None,
        raw => Some(raw as i8),
    }
}

fn u16_be_at(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

fn decode_chain_announce(data: &[u8], origin: &Origin, time: Timestamp) -> FrameOutcome {
    if data.len() < CHAIN_ANNOUNCE_LENGTH {
        return FrameOutcome::Incomplete;
    }

    let mut nonce = [0u8; 16];
    nonce.copy_from_slice(&data[6..CHAIN_ANNOUNCE_LENGTH]);

    FrameOutcome::Decoded(ReelFrame::ChainAnnounce(ChainAnnounce {
        origin: origin.clone(),
        time,
        hop_count: data[1],
        receiver_id: receiver_id_at(data, 2),
        nonce,
    }))
}

fn decode_receiver_telemetry(data: &[u8], origin: &Origin, time: Timestamp) -> FrameOutcome {
    if data.len() < RECEIVER_TELEMETRY_LENGTH {
        return FrameOutcome::Incomplete;
    }

    FrameOutcome::Decoded(ReelFrame::ReceiverTelemetry(ReceiverTelemetry {
        origin: origin.clone(),
        time,
        chain_position: data[1],
        receiver_id: receiver_id_at(data, 2),
        uptime_seconds: u16_be_at(data, 6),
        send_count: u16_be_at(data, 8),
        crc_pass: u16_be_at(data, 10),
        crc_fail: u16_be_at(data, 12),
        max_rssi: raw_rssi_at(data, 14),
        avg_rssi: raw_rssi_at(data, 15),
        min_rssi: raw_rssi_at(data, 16),
        max_lqi: data[17],
        avg_lqi: data[18],
        min_lqi: data[19],
        temperature_celsius: (f64::from(data[20]) - 80.0) / 2.0,
        radio_voltage: 1.8 + f64::from(data[21]) / 34.0,
        serial_voltage_raw: data[22],
    }))
}
