//! UDP provider
//!
//! Each datagram is one chunk of raw reel bytes. The origin is the sender's
//! `ip:port`, so several reels can share one listening socket.

use bytes::Bytes;
use std::net::SocketAddr;
use tokio::net::{ToSocketAddrs, UdpSocket};
use tracing::{info, trace};

use crate::provider::{Provider, ReelChunk};
use crate::types::{Origin, Timestamp};
use crate::{GatewayError, Result};

/// Largest datagram accepted
const MAX_DATAGRAM_SIZE: usize = 65_535;

pub struct UdpProvider {
    socket: UdpSocket,
    local_addr: SocketAddr,
    buffer: Vec<u8>,
}

impl UdpProvider {
    /// Bind a listening socket
    pub async fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await.map_err(|e| {
            GatewayError::transport_failed_with_source("Failed to bind UDP socket", Box::new(e))
        })?;
        let local_addr = socket.local_addr()?;
        info!(%local_addr, "UDP provider listening");

        Ok(Self { socket, local_addr, buffer: vec![0u8; MAX_DATAGRAM_SIZE] })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait::async_trait]
impl Provider for UdpProvider {
    async fn next_chunk(&mut self) -> Result<Option<ReelChunk>> {
        let (len, remote) = self.socket.recv_from(&mut self.buffer).await.map_err(|e| {
            GatewayError::transport_failed_with_source("UDP receive failed", Box::new(e))
        })?;
        let time = Timestamp::now();
        trace!(%remote, len, "Datagram received");

        Ok(Some(ReelChunk {
            origin: Origin::from(remote),
            bytes: Bytes::copy_from_slice(&self.buffer[..len]),
            time,
        }))
    }

    fn describe(&self) -> String {
        format!("udp://{}", self.local_addr)
    }
}
