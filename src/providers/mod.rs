//! Byte source implementations

pub mod synthetic;
pub mod udp;

pub use synthetic::{SyntheticReelProvider, SyntheticTiming};
pub use udp::UdpProvider;
