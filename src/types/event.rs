//! Outbound events
//!
//! Two shapes leave the gateway: a [`DetectionEvent`] for every transmission
//! heard by at least one resolvable receiver, and an [`InfrastructureEvent`]
//! for everything concerning the reel itself. Both serialise in camelCase;
//! infrastructure events carry a `type` discriminator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{IdentifierType, Origin, ReceiverTelemetry, Timestamp};

/// Anything the gateway emits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GatewayEvent {
    Detection(DetectionEvent),
    Infrastructure(InfrastructureEvent),
}

impl GatewayEvent {
    pub fn as_detection(&self) -> Option<&DetectionEvent> {
        match self {
            GatewayEvent::Detection(event) => Some(event),
            GatewayEvent::Infrastructure(_) => None,
        }
    }

    pub fn as_infrastructure(&self) -> Option<&InfrastructureEvent> {
        match self {
            GatewayEvent::Detection(_) => None,
            GatewayEvent::Infrastructure(event) => Some(event),
        }
    }
}

/// One observed transmission and the receivers that decoded it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct DetectionEvent {
    pub transmitter_id: Option<String>,
    pub transmitter_id_type: IdentifierType,
    /// Radio payloads as lowercase hex
    pub raw_packets: Vec<String>,
    pub signature: Vec<ResolvedSignatureEntry>,
    pub origin: Origin,
    pub time: Timestamp,
}

/// A signature entry with the chain position resolved to a receiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSignatureEntry {
    pub receiver_id: Option<String>,
    pub receiver_id_type: IdentifierType,
    pub signal_strength: Option<i16>,
}

/// Events about the reel infrastructure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InfrastructureEvent {
    ReceiverTelemetry(TelemetryReport),
    ReceiverConnected(ReceiverConnected),
    ReceiverDisconnected(ReceiverDisconnected),
    TopologySnapshot(TopologySnapshot),
}

/// Decoded receiver telemetry, repackaged for consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct TelemetryReport {
    pub receiver_id: String,
    pub origin: Origin,
    pub time: Timestamp,
    pub chain_position: u8,
    pub uptime_seconds: u16,
    pub send_count: u16,
    pub crc_pass: u16,
    pub crc_fail: u16,
    pub max_rssi: Option<i8>,
    pub avg_rssi: Option<i8>,
    pub min_rssi: Option<i8>,
    pub max_lqi: u8,
    pub avg_lqi: u8,
    pub min_lqi: u8,
    pub temperature_celsius: f64,
    pub radio_voltage: f64,
    /// Raw byte, calibration unknown
    pub serial_voltage: u8,
}

impl From<&ReceiverTelemetry> for TelemetryReport {
    fn from(frame: &ReceiverTelemetry) -> Self {
        Self {
            receiver_id: frame.receiver_id.to_string(),
            origin: frame.origin.clone(),
            time: frame.time,
            chain_position: frame.chain_position,
            uptime_seconds: frame.uptime_seconds,
            send_count: frame.send_count,
            crc_pass: frame.crc_pass,
            crc_fail: frame.crc_fail,
            max_rssi: frame.max_rssi,
            avg_rssi: frame.avg_rssi,
            min_rssi: frame.min_rssi,
            max_lqi: frame.max_lqi,
            avg_lqi: frame.avg_lqi,
            min_lqi: frame.min_lqi,
            temperature_celsius: frame.temperature_celsius,
            radio_voltage: frame.radio_voltage,
            serial_voltage: frame.serial_voltage_raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct ReceiverConnected {
    pub receiver_id: String,
    pub origin: Origin,
    pub time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct ReceiverDisconnected {
    pub receiver_id: String,
    /// Time of the receiver's last announce
    pub time: Timestamp,
}

/// Chain positions of every known origin
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct TopologySnapshot {
    pub time: Timestamp,
    pub per_origin: BTreeMap<Origin, OriginTopology>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct OriginTopology {
    /// Receiver at each chain position, `None` where unknown
    pub positions: Vec<Option<String>>,
}
