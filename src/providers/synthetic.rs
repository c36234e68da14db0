//! Synthetic reel provider
//!
//! Emits the traffic of a four-receiver reel on a single origin, without
//! hardware: chain announces, receiver telemetry, and two detections per
//! period (one reelyActive RFID tag, one BLE advertiser) whose signal
//! strengths drift randomly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::trace;

use crate::Result;
use crate::provider::{Provider, ReelChunk};
use crate::types::{Origin, Timestamp};

/// Origin used by the synthetic reel
pub const SYNTHETIC_ORIGIN: &str = "test";

/// Announces from hop 3 (chain position 0) down to hop 0
pub const ANNOUNCE_FRAMES: [&str; 4] = [
    "aaaa70030080000000000000000000000000000000000000",
    "aaaa70020081000000000000000000000000000000000000",
    "aaaa70010080000100000000000000000000000000000000",
    "aaaa70000081000100000000000000000000000000000000",
];

/// Telemetry for chain positions 0 to 3: 0 C, 3.3 V
pub const TELEMETRY_FRAMES: [&str; 4] = [
    "aaaa7800008000000000000000000000000000000000503300",
    "aaaa7801008100000000000000000000000000000000503300",
    "aaaa7802008000010000000000000000000000000000503300",
    "aaaa7803008100010000000000000000000000000000503300",
];

// Marker, header and payload of each detection (plus the first chain position for RFID)
const RFID_DETECTION_PREFIX: &str = "aaaa04020100000000";
const BLE_DETECTION_PREFIX: &str =
    "aaaa1802421655daba50e1fe0201050c097265656c79416374697665";

const MIN_RSSI: u8 = 0;
const MAX_RSSI: u8 = 18;

/// Hex text of the two detection frames for the given per-position raw RSSI
///
/// The RFID tag is heard at positions 0 and 2, the BLE advertiser at 1 and 3.
pub fn detection_frames(rssi: [u8; 4]) -> String {
    format!(
        "{}{:02x}02{:02x}{}01{:02x}03{:02x}",
        RFID_DETECTION_PREFIX, rssi[0], rssi[2], BLE_DETECTION_PREFIX, rssi[1], rssi[3]
    )
}

/// Emission periods of the synthetic reel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticTiming {
    pub detection_period: Duration,
    pub announce_period: Duration,
    pub telemetry_period: Duration,
}

impl Default for SyntheticTiming {
    fn default() -> Self {
        Self {
            detection_period: Duration::from_secs(1),
            announce_period: Duration::from_secs(5),
            telemetry_period: Duration::from_secs(60),
        }
    }
}

pub struct SyntheticReelProvider {
    origin: Origin,
    detections: Interval,
    announces: Interval,
    telemetry: Interval,
    rssi: [u8; 4],
    rng: StdRng,
}

impl SyntheticReelProvider {
    /// Create a provider with the default periods
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(seed: u64) -> Self {
        Self::with_timing(SyntheticTiming::default(), seed)
    }

    pub fn with_timing(timing: SyntheticTiming, seed: u64) -> Self {
        Self {
            origin: Origin::from(SYNTHETIC_ORIGIN),
            detections: paced(timing.detection_period),
            announces: paced(timing.announce_period),
            telemetry: paced(timing.telemetry_period),
            rssi: [MIN_RSSI; 4],
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn chunk(&self, text: &str) -> Result<Option<ReelChunk>> {
        let bytes = hex::decode(text)?;
        Ok(Some(ReelChunk::new(self.origin.clone(), bytes, Timestamp::now())))
    }

    /// Move each RSSI by -3 to +2, clamped to the simulated range
    fn drift_rssi(&mut self) {
        let mut deltas = [0u8; 4];
        self.rng.fill_bytes(&mut deltas);
        for (rssi, delta) in self.rssi.iter_mut().zip(deltas) {
            let shifted = i16::from(*rssi) + i16::from(delta % 6) - 3;
            *rssi = shifted.clamp(i16::from(MIN_RSSI), i16::from(MAX_RSSI)) as u8;
        }
    }
}

fn paced(period: Duration) -> Interval {
    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[async_trait::async_trait]
impl Provider for SyntheticReelProvider {
    async fn next_chunk(&mut self) -> Result<Option<ReelChunk>> {
        // Announces win ties so the chain exists before the first detection
        tokio::select! {
            biased;
            _ = self.announces.tick() => {
                trace!("Synthetic announce");
                self.chunk(&ANNOUNCE_FRAMES.concat())
            }
            _ = self.telemetry.tick() => {
                trace!("Synthetic telemetry");
                self.chunk(&TELEMETRY_FRAMES.concat())
            }
            _ = self.detections.tick() => {
                let text = detection_frames(self.rssi);
                self.drift_rssi();
                self.chunk(&text)
            }
        }
    }

    fn describe(&self) -> String {
        format!("synthetic reel ({})", self.origin)
    }
}
