//! Test utilities for building wire frames
//!
//! Builders return complete frames including the marker, so tests and
//! benchmarks can concatenate, split and corrupt them freely.

#![cfg(any(test, feature = "benchmark"))]

use crate::types::{CHAIN_ANNOUNCE_CODE, MARKER, RECEIVER_TELEMETRY_CODE};

/// Chain announce frame for a receiver `hop_count` hops from the head
pub fn announce_frame(hop_count: u8, id: [u8; 4]) -> Vec<u8> {
    announce_frame_with_nonce(hop_count, id, [0u8; 16])
}

pub fn announce_frame_with_nonce(hop_count: u8, id: [u8; 4], nonce: [u8; 16]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(24);
    frame.extend_from_slice(&MARKER);
    frame.push(CHAIN_ANNOUNCE_CODE);
    frame.push(hop_count);
    frame.extend_from_slice(&id);
    frame.extend_from_slice(&nonce);
    frame
}

/// Receiver telemetry frame
///
/// `counters` holds uptime, send count, CRC pass and CRC fail as big-endian
/// pairs; `rssi` is max/avg/min. LQI bytes are zero.
pub fn telemetry_frame(
    chain_position: u8,
    id: [u8; 4],
    counters: [u8; 8],
    rssi: [u8; 3],
    temperature: u8,
    radio_voltage: u8,
    serial_voltage: u8,
) -> Vec<u8> {
    let mut frame = Vec::with_capacity(25);
    frame.extend_from_slice(&MARKER);
    frame.push(RECEIVER_TELEMETRY_CODE);
    frame.push(chain_position);
    frame.extend_from_slice(&id);
    frame.extend_from_slice(&counters);
    frame.extend_from_slice(&rssi);
    frame.extend_from_slice(&[0, 0, 0]);
    frame.push(temperature);
    frame.push(radio_voltage);
    frame.push(serial_voltage);
    frame
}

/// Detection report frame from a payload and (chain position, raw RSSI) pairs
///
/// Pairs are written as given, so out-of-order positions can be tested.
pub fn detection_frame(payload: &[u8], pairs: &[(u8, u8)]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(4 + payload.len() + 2 * pairs.len());
    frame.extend_from_slice(&MARKER);
    frame.push(payload.len() as u8);
    frame.push(pairs.len() as u8);
    frame.extend_from_slice(payload);
    for &(chain_position, rssi) in pairs {
        frame.push(chain_position);
        frame.push(rssi);
    }
    frame
}

/// Identity bytes for the `n`th test receiver
pub fn receiver_bytes(n: u32) -> [u8; 4] {
    (0x0080_0000 | n).to_be_bytes()
}

/// A reel of `length` receivers announcing hop counts `0..length`, head first
pub fn reel_announces(length: u8) -> Vec<u8> {
    (0..length)
        .flat_map(|hop| announce_frame(hop, receiver_bytes(hop as u32)))
        .collect()
}

/// Initialise a tracing subscriber for tests that want log output
#[cfg(test)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CHAIN_ANNOUNCE_LENGTH, RECEIVER_TELEMETRY_LENGTH, detection_frame_length};

    #[test]
    fn builders_produce_wire_lengths() {
        assert_eq!(announce_frame(0, [0; 4]).len(), MARKER.len() + CHAIN_ANNOUNCE_LENGTH);
        assert_eq!(
            telemetry_frame(0, [0; 4], [0; 8], [0; 3], 0, 0, 0).len(),
            MARKER.len() + RECEIVER_TELEMETRY_LENGTH
        );
        assert_eq!(
            detection_frame(&[1, 2, 3, 4], &[(0, 0), (1, 0)]).len(),
            MARKER.len() + detection_frame_length(4, 2)
        );
    }

    #[test]
    fn reel_announces_are_concatenated() {
        let reel = reel_announces(3);
        assert_eq!(reel.len(), 3 * 24);
        assert_eq!(reel[24 + 3], 1);
    }
}
