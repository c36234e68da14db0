//! Gateway host: submission handle and event subscriptions

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::dispatcher::DispatcherStats;
use crate::driver::Driver;
use crate::provider::{Provider, ReelChunk};
use crate::types::{
    DetectionEvent, GatewayEvent, InfrastructureEvent, Origin, Timestamp, TopologySnapshot,
};
use crate::{GatewayError, Result};

/// Cloneable entry point for transports pushing bytes into a gateway
///
/// Chunks from one handle are processed in the order they were submitted.
#[derive(Debug, Clone)]
pub struct GatewayHandle {
    submissions: mpsc::Sender<ReelChunk>,
    capacity: usize,
}

impl GatewayHandle {
    /// Submit bytes captured from `origin`, waiting for queue space
    pub async fn submit_bytes(
        &self,
        origin: impl Into<Origin>,
        bytes: impl Into<Bytes>,
        time: Timestamp,
    ) -> Result<()> {
        self.submit_chunk(ReelChunk::new(origin, bytes, time)).await
    }

    /// Submit bytes without waiting
    ///
    /// Fails with [`GatewayError::QueueFull`] when the submission queue is full.
    pub fn try_submit_bytes(
        &self,
        origin: impl Into<Origin>,
        bytes: impl Into<Bytes>,
        time: Timestamp,
    ) -> Result<()> {
        match self.submissions.try_send(ReelChunk::new(origin, bytes, time)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(GatewayError::QueueFull { capacity: self.capacity }),
            Err(TrySendError::Closed(_)) => Err(GatewayError::Closed),
        }
    }

    /// Submit hexadecimal text, as delivered by text-mode transports
    pub async fn submit_hex(
        &self,
        origin: impl Into<Origin>,
        text: &str,
        time: Timestamp,
    ) -> Result<()> {
        let bytes = hex::decode(text.trim())?;
        self.submit_bytes(origin, bytes, time).await
    }

    pub async fn submit_chunk(&self, chunk: ReelChunk) -> Result<()> {
        self.submissions.send(chunk).await.map_err(|_| GatewayError::Closed)
    }

    /// Whether the gateway task has stopped
    pub fn is_closed(&self) -> bool {
        self.submissions.is_closed()
    }
}

/// A running gateway
///
/// Owns the coordinating task. Dropping the gateway cancels it, along with
/// every provider added to it.
pub struct Gateway {
    handle: GatewayHandle,
    events: broadcast::Sender<GatewayEvent>,
    topology: watch::Receiver<Option<Arc<TopologySnapshot>>>,
    stats: watch::Receiver<DispatcherStats>,
    config: GatewayConfig,
    cancel: CancellationToken,
}

impl Gateway {
    /// Validate `config` and start the gateway task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: GatewayConfig) -> Result<Self> {
        config.validate()?;
        let channels = Driver::spawn(&config);
        info!(
            include_unknown_receivers = config.include_unknown_receivers,
            rssi_mode = ?config.rssi_mode,
            "Gateway started"
        );

        Ok(Self {
            handle: GatewayHandle {
                submissions: channels.submissions,
                capacity: config.submission_capacity,
            },
            events: channels.events,
            topology: channels.topology,
            stats: channels.stats,
            config,
            cancel: channels.cancel,
        })
    }

    /// Feed the gateway from `provider` until it ends or the gateway stops
    pub fn add_provider<P: Provider>(&self, provider: P) {
        Driver::spawn_provider(provider, self.handle.submissions.clone(), self.cancel.child_token());
    }

    /// Handle for pushing bytes from transports
    pub fn handle(&self) -> GatewayHandle {
        self.handle.clone()
    }

    /// Every event, in emission order
    ///
    /// Subscribers that fall more than `event_capacity` events behind lose
    /// the oldest ones.
    pub fn events(&self) -> impl Stream<Item = GatewayEvent> + 'static {
        BroadcastStream::new(self.events.subscribe()).filter_map(|result| async move {
            match result {
                Ok(event) => Some(event),
                Err(lagged) => {
                    warn!("Event subscriber fell behind: {}", lagged);
                    None
                }
            }
        })
    }

    /// Detection events only
    pub fn detections(&self) -> impl Stream<Item = DetectionEvent> + 'static {
        self.events().filter_map(|event| async move {
            match event {
                GatewayEvent::Detection(detection) => Some(detection),
                GatewayEvent::Infrastructure(_) => None,
            }
        })
    }

    /// Infrastructure events only
    pub fn infrastructure(&self) -> impl Stream<Item = InfrastructureEvent> + 'static {
        self.events().filter_map(|event| async move {
            match event {
                GatewayEvent::Infrastructure(infrastructure) => Some(infrastructure),
                GatewayEvent::Detection(_) => None,
            }
        })
    }

    /// Topology snapshots, starting with the latest one if any
    pub fn topology_updates(&self) -> impl Stream<Item = Arc<TopologySnapshot>> + 'static {
        WatchStream::new(self.topology.clone()).filter_map(|opt| async move { opt })
    }

    /// Latest topology snapshot, if one has been emitted
    pub fn current_topology(&self) -> Option<Arc<TopologySnapshot>> {
        self.topology.borrow().clone()
    }

    /// Decoder counters
    pub fn stats(&self) -> DispatcherStats {
        *self.stats.borrow()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Stop the gateway task and its providers
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        debug!("Dropping gateway");
        self.cancel.cancel();
    }
}
