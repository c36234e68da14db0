//! Topology manager
//!
//! Turns decoded frames into consumer events while maintaining a model of
//! every reel: one [`ChainRecord`] per origin and a global
//! [`LivenessTable`]. The manager is synchronous and has no clock of its own;
//! the host calls [`TopologyManager::sweep`] with the current time.
//!
//! ```rust
//! use reelgate::topology::TopologyManager;
//! use reelgate::types::{ChainAnnounce, Origin, ReceiverId, ReelFrame, Timestamp};
//!
//! let mut manager = TopologyManager::new(false);
//! let events = manager.handle_frame(&ReelFrame::ChainAnnounce(ChainAnnounce {
//!     origin: Origin::from("reel"),
//!     time: Timestamp::from_millis(0),
//!     hop_count: 0,
//!     receiver_id: ReceiverId::from_reel_bytes([0x00, 0x81, 0x00, 0x01]),
//!     nonce: [0; 16],
//! }));
//!
//! // receiverConnected, then a topology snapshot for the new chain
//! assert_eq!(events.len(), 2);
//! ```

mod chain;
mod liveness;

pub use chain::{ChainChange, ChainRecord, Slot};
pub use liveness::LivenessTable;

use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::types::{
    ChainAnnounce, DetectionEvent, DetectionReport, GatewayEvent, IdentifierType,
    InfrastructureEvent, Origin, ReceiverConnected, ReceiverDisconnected, ReceiverTelemetry,
    ReelFrame, ResolvedSignatureEntry, TelemetryReport, Timestamp, TopologySnapshot,
};

/// Owner of all chain records and receiver liveness
#[derive(Debug, Default)]
pub struct TopologyManager {
    include_unknown_receivers: bool,
    chains: BTreeMap<Origin, ChainRecord>,
    liveness: LivenessTable,
}

impl TopologyManager {
    /// Create a manager
    ///
    /// With `include_unknown_receivers` set, detection signature entries at
    /// unresolved chain positions are kept with an `Unknown` receiver instead
    /// of being dropped.
    pub fn new(include_unknown_receivers: bool) -> Self {
        Self { include_unknown_receivers, ..Self::default() }
    }

    /// Process one decoded frame and return the events it produces
    pub fn handle_frame(&mut self, frame: &ReelFrame) -> Vec<GatewayEvent> {
        match frame {
            ReelFrame::ChainAnnounce(announce) => self.handle_announce(announce),
            ReelFrame::DetectionReport(report) => self.handle_detection(report).into_iter().collect(),
            ReelFrame::ReceiverTelemetry(telemetry) => vec![handle_telemetry(telemetry)],
        }
    }

    fn handle_announce(&mut self, announce: &ChainAnnounce) -> Vec<GatewayEvent> {
        let mut events = Vec::new();

        if self.liveness.touch(announce.receiver_id, announce.time) {
            info!(
                receiver = %announce.receiver_id,
                origin = %announce.origin,
                "Receiver connected"
            );
            events.push(GatewayEvent::Infrastructure(InfrastructureEvent::ReceiverConnected(
                ReceiverConnected {
                    receiver_id: announce.receiver_id.to_string(),
                    origin: announce.origin.clone(),
                    time: announce.time,
                },
            )));
        }

        let chain = self.chains.entry(announce.origin.clone()).or_default();
        let change = chain.apply_announce(announce.hop_count, announce.receiver_id);
        if change == ChainChange::Reset {
            warn!(
                origin = %announce.origin,
                hop_count = announce.hop_count,
                receiver = %announce.receiver_id,
                "Chain identity conflict, rebuilding chain"
            );
        }

        if change.is_structural() {
            events.push(self.snapshot_event(announce.time));
        }
        events
    }

    fn handle_detection(&self, report: &DetectionReport) -> Option<GatewayEvent> {
        let chain = self.chains.get(&report.origin);

        let signature: Vec<ResolvedSignatureEntry> = report
            .signature
            .iter()
            .filter_map(|entry| {
                match chain.and_then(|chain| chain.resolve(entry.chain_position)) {
                    Some(receiver) => Some(ResolvedSignatureEntry {
                        receiver_id: Some(receiver.to_string()),
                        receiver_id_type: IdentifierType::Eui64,
                        signal_strength: entry.signal_strength,
                    }),
                    None if self.include_unknown_receivers => Some(ResolvedSignatureEntry {
                        receiver_id: None,
                        receiver_id_type: IdentifierType::Unknown,
                        signal_strength: entry.signal_strength,
                    }),
                    None => None,
                }
            })
            .collect();

        if signature.is_empty() {
            debug!(
                origin = %report.origin,
                transmitter = ?report.transmitter.identifier,
                "Suppressing detection with no resolvable receivers"
            );
            return None;
        }

        Some(GatewayEvent::Detection(DetectionEvent {
            transmitter_id: report.transmitter.identifier.clone(),
            transmitter_id_type: report.transmitter.identifier_type,
            raw_packets: vec![hex::encode(&report.payload)],
            signature,
            origin: report.origin.clone(),
            time: report.time,
        }))
    }

    /// Evict receivers silent for longer than `threshold`, then emit a snapshot
    ///
    /// A receiver is evicted when its last announce is strictly older than
    /// `now - threshold`. Disconnection events carry the last announce time.
    pub fn sweep(&mut self, now: Timestamp, threshold: Duration) -> Vec<GatewayEvent> {
        let cutoff = now.saturating_sub(threshold);
        let mut events = Vec::new();

        for (receiver, last_announce) in self.liveness.expire(cutoff) {
            for (origin, chain) in self.chains.iter_mut() {
                if chain.remove(receiver) {
                    debug!(origin = %origin, receiver = %receiver, "Removed receiver from chain");
                }
            }
            info!(receiver = %receiver, last_announce = %last_announce, "Receiver disconnected");
            events.push(GatewayEvent::Infrastructure(InfrastructureEvent::ReceiverDisconnected(
                ReceiverDisconnected { receiver_id: receiver.to_string(), time: last_announce },
            )));
        }

        events.push(self.snapshot_event(now));
        events
    }

    /// Current chain positions of every origin
    pub fn snapshot(&self, time: Timestamp) -> TopologySnapshot {
        TopologySnapshot {
            time,
            per_origin: self
                .chains
                .iter()
                .map(|(origin, chain)| (origin.clone(), chain.to_topology()))
                .collect(),
        }
    }

    fn snapshot_event(&self, time: Timestamp) -> GatewayEvent {
        GatewayEvent::Infrastructure(InfrastructureEvent::TopologySnapshot(self.snapshot(time)))
    }

    pub fn chain(&self, origin: &Origin) -> Option<&ChainRecord> {
        self.chains.get(origin)
    }

    pub fn liveness(&self) -> &LivenessTable {
        &self.liveness
    }
}

fn handle_telemetry(telemetry: &ReceiverTelemetry) -> GatewayEvent {
    GatewayEvent::Infrastructure(InfrastructureEvent::ReceiverTelemetry(TelemetryReport::from(
        telemetry,
    )))
}
