//! Gateway configuration
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```yaml
//! include_unknown_receivers: false
//! sweep_interval_ms: 60000
//! inactivity_threshold_ms: 60000   # defaults to sweep_interval_ms
//! event_capacity: 1024
//! submission_capacity: 256
//! rssi_mode: calibrated            # or legacy_wrap
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::decoder::{DecoderOptions, RssiMode};
use crate::{GatewayError, Result};

const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60_000;
const DEFAULT_EVENT_CAPACITY: usize = 1024;
const DEFAULT_SUBMISSION_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Keep detection entries whose chain position is unresolved
    pub include_unknown_receivers: bool,
    /// Time between the end of one sweep and the start of the next
    pub sweep_interval_ms: u64,
    /// Silence after which a receiver is disconnected
    pub inactivity_threshold_ms: Option<u64>,
    /// Events buffered per subscriber before it starts losing them
    pub event_capacity: usize,
    /// Byte chunks queued between transports and the gateway task
    pub submission_capacity: usize,
    pub rssi_mode: RssiMode,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            include_unknown_receivers: false,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            inactivity_threshold_ms: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            submission_capacity: DEFAULT_SUBMISSION_CAPACITY,
            rssi_mode: RssiMode::default(),
        }
    }
}

impl GatewayConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| GatewayError::parse_error("gateway configuration", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read gateway configuration {}", path.display()))?;
        Self::from_yaml_str(&yaml)
            .with_context(|| format!("Invalid gateway configuration {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval_ms == 0 {
            return Err(GatewayError::invalid_config("sweep_interval_ms", "must be non-zero"));
        }
        if self.inactivity_threshold_ms == Some(0) {
            return Err(GatewayError::invalid_config("inactivity_threshold_ms", "must be non-zero"));
        }
        if self.event_capacity == 0 {
            return Err(GatewayError::invalid_config("event_capacity", "must be non-zero"));
        }
        if self.submission_capacity == 0 {
            return Err(GatewayError::invalid_config("submission_capacity", "must be non-zero"));
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn inactivity_threshold(&self) -> Duration {
        Duration::from_millis(self.inactivity_threshold_ms.unwrap_or(self.sweep_interval_ms))
    }

    pub fn decoder_options(&self) -> DecoderOptions {
        DecoderOptions { rssi_mode: self.rssi_mode }
    }
}
