//! Protocol layer for reels: daisy chains of radio receivers behind one
//! gateway connection.
//!
//! Reelgate turns the raw byte stream of a reel into consumer events. It
//! reassembles frames from arbitrarily chunked input, decodes transmitter
//! detections, chain announces and receiver telemetry, reconstructs which
//! receiver sits at which chain position, and tracks receiver liveness.
//!
//! # Features
//!
//! - **Resynchronising decoder**: malformed spans are skipped at the next marker
//! - **Live topology**: chain positions resolved to receiver identities
//! - **Pluggable transports**: UDP, a synthetic reel, or push bytes yourself
//! - **Stream subscriptions**: detections, infrastructure events, topology
//!
//! # Architecture
//!
//! ```text
//! Provider / GatewayHandle -> StreamDispatcher -> FrameDecoder
//!                                    |
//!                                    v
//!                            TopologyManager -> broadcast -> subscribers
//! ```
//!
//! The [`dispatcher`] and [`topology`] modules are synchronous and clock-free
//! and can be used without the async host.
//!
//! ## Example (synthetic reel)
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use reelgate::{GatewayConfig, Reelgate};
//!
//! #[tokio::main]
//! async fn main() -> reelgate::Result<()> {
//!     let gateway = Reelgate::synthetic(GatewayConfig::default())?;
//!     let mut detections = Box::pin(gateway.detections());
//!
//!     while let Some(detection) = detections.next().await {
//!         println!("{:?} heard by {} receivers", detection.transmitter_id, detection.signature.len());
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Protocol core
pub mod decoder;
pub mod dispatcher;
pub mod topology;

// Host runtime
pub mod config;
pub mod driver;
pub mod gateway;
pub mod provider;
pub mod providers;

// Core exports
pub use error::*;
pub use types::*;

pub use config::GatewayConfig;
pub use decoder::{
    DecoderOptions, DefaultIdentifierExtractor, FrameDecoder, IdentifierExtractor, RssiMode,
};
pub use dispatcher::{DispatcherStats, StreamDispatcher};
pub use gateway::{Gateway, GatewayHandle};
pub use provider::{Provider, ReelChunk};
pub use providers::{SyntheticReelProvider, UdpProvider};
pub use topology::TopologyManager;

/// Unified entry point for reel gateways.
///
/// Each constructor validates the configuration, starts the gateway task
/// and attaches the matching provider. More providers can be attached with
/// [`Gateway::add_provider`], and bytes can always be pushed through
/// [`Gateway::handle`].
///
/// # Examples
///
/// ## UDP
/// ```rust,no_run
/// use reelgate::{GatewayConfig, Reelgate};
///
/// #[tokio::main]
/// async fn main() -> reelgate::Result<()> {
///     let gateway = Reelgate::listen_udp("0.0.0.0:50000", GatewayConfig::default()).await?;
///     // Subscribe to gateway events...
///     Ok(())
/// }
/// ```
///
/// ## Push-based transport
/// ```rust,no_run
/// use reelgate::{GatewayConfig, Reelgate, Timestamp};
///
/// #[tokio::main]
/// async fn main() -> reelgate::Result<()> {
///     let gateway = Reelgate::start(GatewayConfig::default())?;
///     let handle = gateway.handle();
///     handle.submit_hex("/dev/ttyUSB0", "aaaa7000008100010000", Timestamp::now()).await?;
///     Ok(())
/// }
/// ```
pub struct Reelgate;

impl Reelgate {
    /// Start a gateway with no providers attached.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the configuration is invalid.
    pub fn start(config: GatewayConfig) -> Result<Gateway> {
        Gateway::spawn(config)
    }

    /// Start a gateway fed by a UDP socket bound to `addr`.
    ///
    /// Every sender address is its own origin.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The socket cannot be bound
    pub async fn listen_udp<A>(addr: A, config: GatewayConfig) -> Result<Gateway>
    where
        A: tokio::net::ToSocketAddrs,
    {
        let provider = UdpProvider::bind(addr).await?;
        let gateway = Gateway::spawn(config)?;
        gateway.add_provider(provider);
        Ok(gateway)
    }

    /// Start a gateway fed by a synthetic four-receiver reel.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the configuration is invalid.
    pub fn synthetic(config: GatewayConfig) -> Result<Gateway> {
        let gateway = Gateway::spawn(config)?;
        gateway.add_provider(SyntheticReelProvider::new(Timestamp::now().as_millis()));
        Ok(gateway)
    }
}
