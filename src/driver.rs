//! Driver spawns and manages the gateway tasks
//!
//! One coordinating task owns the [`StreamDispatcher`] and the
//! [`TopologyManager`]. Everything that mutates reel state happens on that
//! task: byte submissions in arrival order, interleaved with the periodic
//! sweep. Providers run in their own tasks and only feed the submission
//! queue.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::GatewayConfig;
use crate::decoder::FrameDecoder;
use crate::dispatcher::{DispatcherStats, StreamDispatcher};
use crate::provider::{Provider, ReelChunk};
use crate::topology::TopologyManager;
use crate::types::{GatewayEvent, InfrastructureEvent, Timestamp, TopologySnapshot};

/// Consecutive provider errors tolerated before the provider is abandoned
const MAX_ERRORS: u32 = 10;

/// Channels connecting the coordinating task to the outside
pub struct DriverChannels {
    /// Sender for byte chunks
    pub submissions: mpsc::Sender<ReelChunk>,
    /// Broadcast of every emitted event; subscribe for a receiver
    pub events: broadcast::Sender<GatewayEvent>,
    /// Latest topology snapshot
    pub topology: watch::Receiver<Option<Arc<TopologySnapshot>>>,
    /// Decoder counters, updated after every chunk
    pub stats: watch::Receiver<DispatcherStats>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

/// State owned by the coordinating task
struct Coordinator {
    dispatcher: StreamDispatcher,
    manager: TopologyManager,
    inactivity_threshold: Duration,
    events: broadcast::Sender<GatewayEvent>,
    topology: watch::Sender<Option<Arc<TopologySnapshot>>>,
    stats: watch::Sender<DispatcherStats>,
}

impl Coordinator {
    fn handle_chunk(&mut self, chunk: ReelChunk) {
        let frames = self.dispatcher.submit_bytes(&chunk.origin, &chunk.bytes, chunk.time);
        trace!(origin = %chunk.origin, bytes = chunk.bytes.len(), frames = frames.len(), "Chunk processed");

        for frame in &frames {
            let events = self.manager.handle_frame(frame);
            self.publish(events);
        }
        self.stats.send_replace(self.dispatcher.stats());
    }

    fn sweep(&mut self, now: Timestamp) {
        let events = self.manager.sweep(now, self.inactivity_threshold);
        debug!(events = events.len(), "Sweep complete");
        self.publish(events);
    }

    fn publish(&self, events: Vec<GatewayEvent>) {
        for event in events {
            if let GatewayEvent::Infrastructure(InfrastructureEvent::TopologySnapshot(snapshot)) =
                &event
            {
                self.topology.send_replace(Some(Arc::new(snapshot.clone())));
            }
            // No subscribers is not an error: delivery is fire-and-forget
            let _ = self.events.send(event);
        }
    }
}

/// Driver spawns and manages gateway tasks
pub struct Driver;

impl Driver {
    /// Spawn the coordinating task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: &GatewayConfig) -> DriverChannels {
        let (submission_tx, submission_rx) = mpsc::channel(config.submission_capacity);
        let (event_tx, _) = broadcast::channel(config.event_capacity);
        let (topology_tx, topology_rx) = watch::channel(None);
        let (stats_tx, stats_rx) = watch::channel(DispatcherStats::default());
        let cancel = CancellationToken::new();

        let coordinator = Coordinator {
            dispatcher: StreamDispatcher::new(FrameDecoder::new(config.decoder_options())),
            manager: TopologyManager::new(config.include_unknown_receivers),
            inactivity_threshold: config.inactivity_threshold(),
            events: event_tx.clone(),
            topology: topology_tx,
            stats: stats_tx,
        };

        let sweep_interval = config.sweep_interval();
        let cancel_task = cancel.clone();
        tokio::spawn(async move {
            Self::coordinator_task(coordinator, submission_rx, sweep_interval, cancel_task).await;
        });

        DriverChannels {
            submissions: submission_tx,
            events: event_tx,
            topology: topology_rx,
            stats: stats_rx,
            cancel,
        }
    }

    /// Coordinating task - serializes submissions and sweeps
    async fn coordinator_task(
        mut coordinator: Coordinator,
        mut submissions: mpsc::Receiver<ReelChunk>,
        sweep_interval: Duration,
        cancel: CancellationToken,
    ) {
        info!(sweep_interval_ms = sweep_interval.as_millis() as u64, "Gateway task started");
        let mut chunk_count = 0u64;
        let mut next_sweep = Instant::now() + sweep_interval;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Gateway task cancelled");
                    break;
                }
                chunk = submissions.recv() => match chunk {
                    Some(chunk) => {
                        chunk_count += 1;
                        coordinator.handle_chunk(chunk);
                    }
                    None => {
                        debug!("All submitters dropped, shutting down");
                        break;
                    }
                },
                _ = sleep_until(next_sweep) => {
                    coordinator.sweep(Timestamp::now());
                    // Measured from the end of this sweep, not a fixed phase
                    next_sweep = Instant::now() + sweep_interval;
                }
            }
        }

        info!(
            chunks = chunk_count,
            frames = coordinator.dispatcher.stats().frames_decoded,
            "Gateway task ended"
        );
    }

    /// Spawn a task pumping `provider` into the submission queue
    ///
    /// The task ends when the provider ends, after [`MAX_ERRORS`] consecutive
    /// errors, when the gateway is gone, or on cancellation.
    pub fn spawn_provider<P>(
        provider: P,
        submissions: mpsc::Sender<ReelChunk>,
        cancel: CancellationToken,
    ) -> JoinHandle<()>
    where
        P: Provider,
    {
        tokio::spawn(async move {
            Self::provider_task(provider, submissions, cancel).await;
        })
    }

    /// Provider task - reads chunks and forwards them in order
    async fn provider_task<P>(
        mut provider: P,
        submissions: mpsc::Sender<ReelChunk>,
        cancel: CancellationToken,
    ) where
        P: Provider,
    {
        let source = provider.describe();
        info!(%source, "Provider task started");
        let mut chunk_count = 0u64;
        let mut error_count = 0u32;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!(%source, "Provider cancelled during read");
                    break;
                }
                result = provider.next_chunk() => result,
            };

            match result {
                Ok(Some(chunk)) => {
                    chunk_count += 1;
                    error_count = 0;
                    if submissions.send(chunk).await.is_err() {
                        debug!(%source, "Gateway task gone, stopping provider");
                        break;
                    }
                }
                Ok(None) => {
                    info!(%source, chunks = chunk_count, "Provider stream ended");
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    warn!(%source, "Provider error ({}/{}): {}", error_count, MAX_ERRORS, e);

                    if error_count >= MAX_ERRORS {
                        error!(%source, "Too many provider errors, abandoning provider");
                        break;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ... capped at 1.6s
                    let backoff = Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = sleep(backoff) => {}
                    }
                }
            }
        }

        info!(%source, chunks = chunk_count, "Provider task ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GatewayError;
    use crate::test_utils::{announce_frame, init_tracing};
    use crate::types::Origin;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedProvider {
        chunks: VecDeque<crate::Result<Option<ReelChunk>>>,
    }

    #[async_trait::async_trait]
    impl Provider for ScriptedProvider {
        async fn next_chunk(&mut self) -> crate::Result<Option<ReelChunk>> {
            self.chunks.pop_front().unwrap_or(Ok(None))
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    struct FailingProvider {
        calls: Arc<AtomicU32>,
    }

    #[async_trait::async_trait]
    impl Provider for FailingProvider {
        async fn next_chunk(&mut self) -> crate::Result<Option<ReelChunk>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GatewayError::transport_failed("unplugged"))
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    fn chunk(n: u8) -> ReelChunk {
        ReelChunk::new("p", vec![n], Timestamp::from_millis(n as u64))
    }

    #[tokio::test(start_paused = true)]
    async fn provider_chunks_are_forwarded_in_order_across_errors() {
        let provider = ScriptedProvider {
            chunks: VecDeque::from(vec![
                Ok(Some(chunk(1))),
                Err(GatewayError::transport_failed("glitch")),
                Ok(Some(chunk(2))),
                Ok(None),
                Ok(Some(chunk(3))),
            ]),
        };
        let (tx, mut rx) = mpsc::channel(8);
        Driver::spawn_provider(provider, tx, CancellationToken::new()).await.unwrap();

        assert_eq!(rx.recv().await, Some(chunk(1)));
        assert_eq!(rx.recv().await, Some(chunk(2)));
        // Ended at Ok(None); the sender was dropped with the task
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn provider_is_abandoned_after_max_errors() {
        init_tracing();
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, _rx) = mpsc::channel(8);
        let task = Driver::spawn_provider(
            FailingProvider { calls: Arc::clone(&calls) },
            tx,
            CancellationToken::new(),
        );

        task.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ERRORS);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_provider_during_backoff() {
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, _rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let task =
            Driver::spawn_provider(FailingProvider { calls: Arc::clone(&calls) }, tx, cancel.clone());

        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
        task.await.unwrap();
        assert!(calls.load(Ordering::SeqCst) < MAX_ERRORS);
    }

    #[tokio::test(start_paused = true)]
    async fn coordinator_publishes_events_and_topology() {
        init_tracing();
        let channels = Driver::spawn(&GatewayConfig::default());
        let mut events = channels.events.subscribe();

        let bytes = announce_frame(0, [0x00, 0x80, 0x00, 0x00]);
        channels
            .submissions
            .send(ReelChunk::new("reel", bytes, Timestamp::from_millis(42)))
            .await
            .unwrap();

        let connected = events.recv().await.unwrap();
        assert!(matches!(
            connected,
            GatewayEvent::Infrastructure(InfrastructureEvent::ReceiverConnected(_))
        ));
        let snapshot = events.recv().await.unwrap();
        assert!(matches!(
            snapshot,
            GatewayEvent::Infrastructure(InfrastructureEvent::TopologySnapshot(_))
        ));

        let mut topology = channels.topology.clone();
        let latest = topology.wait_for(Option::is_some).await.unwrap().clone().unwrap();
        assert_eq!(latest.time, Timestamp::from_millis(42));
        assert!(latest.per_origin.contains_key(&Origin::from("reel")));

        let stats = *channels.stats.borrow();
        assert_eq!(stats.frames_decoded, 1);
        channels.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_runs_on_the_configured_interval() {
        let config = GatewayConfig { sweep_interval_ms: 1_000, ..GatewayConfig::default() };
        let channels = Driver::spawn(&config);
        let mut events = channels.events.subscribe();

        // Nothing submitted: the only event is the sweep's snapshot
        let start = Instant::now();
        let event = events.recv().await.unwrap();
        assert!(matches!(
            event,
            GatewayEvent::Infrastructure(InfrastructureEvent::TopologySnapshot(_))
        ));
        assert!(start.elapsed() >= Duration::from_millis(1_000));
        channels.cancel.cancel();
    }
}
