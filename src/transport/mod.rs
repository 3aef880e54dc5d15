//! The audio transport a sender session runs on.
//!
//! [`Transport`] is the whole surface the harness depends on: context and
//! session lifecycle, endpoint descriptors, interface binding and paced frame
//! writes. Packetization, FEC and network I/O live behind it.
//!
//! With the `udp` feature (on by default) the crate also ships
//! [`UdpTransport`], a minimal implementation that sends raw PCM datagrams
//! and paces writes with an internal clock.

pub mod error;
pub mod traits;

#[cfg(feature = "udp")]
pub mod pacing;

#[cfg(feature = "udp")]
pub mod udp;

pub use error::{TransportError, TransportResult};
pub use traits::{
    ChannelSet, ClockSource, ContextConfig, Frame, FrameEncoding, Interface, Protocol,
    SessionConfig, Transport,
};

#[cfg(feature = "udp")]
pub use udp::UdpTransport;
