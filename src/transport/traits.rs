//! Core traits and value types for the sending transport.

use super::error::TransportResult;
use std::fmt;

/// A connection-oriented audio transport that sessions are opened against.
///
/// Implementations own packetization, clocking and network I/O. The harness
/// only drives the lifecycle: open a context, open a session from it, bind
/// one endpoint per interface, push frames, then close session and context.
///
/// Closing consumes the handle, so a closed session or context cannot be
/// touched again.
pub trait Transport {
    /// Process-scoped shared resources required by every session.
    type Context;
    /// One outbound audio stream.
    type Session;
    /// A transient destination descriptor.
    type Endpoint;

    /// Open a new context.
    fn open_context(&self, config: &ContextConfig) -> TransportResult<Self::Context>;

    /// Close a context. Must happen after every session opened from it is closed.
    fn close_context(&self, context: Self::Context) -> TransportResult<()>;

    /// Open a sending session with a fixed input format.
    fn open_session(
        &self,
        context: &Self::Context,
        config: &SessionConfig,
    ) -> TransportResult<Self::Session>;

    /// Close a sending session.
    fn close_session(&self, session: Self::Session) -> TransportResult<()>;

    /// Allocate an empty endpoint descriptor.
    fn allocate_endpoint(&self) -> TransportResult<Self::Endpoint>;

    /// Set the protocol of an endpoint descriptor.
    fn set_protocol(
        &self,
        endpoint: &mut Self::Endpoint,
        protocol: Protocol,
    ) -> TransportResult<()>;

    /// Set the host of an endpoint descriptor.
    fn set_host(&self, endpoint: &mut Self::Endpoint, host: &str) -> TransportResult<()>;

    /// Set the port of an endpoint descriptor.
    fn set_port(&self, endpoint: &mut Self::Endpoint, port: u16) -> TransportResult<()>;

    /// Release an endpoint descriptor.
    fn deallocate_endpoint(&self, endpoint: Self::Endpoint) -> TransportResult<()>;

    /// Connect one interface of the session to a remote endpoint.
    ///
    /// The endpoint is only read; the caller still owns and releases it.
    fn connect(
        &self,
        session: &mut Self::Session,
        interface: Interface,
        endpoint: &Self::Endpoint,
    ) -> TransportResult<()>;

    /// Write one frame of interleaved samples.
    ///
    /// With [`ClockSource::Internal`] this may suspend the caller until the
    /// session's clock is ready for the frame. That suspension is the only
    /// backpressure the caller sees.
    async fn write(&self, session: &mut Self::Session, frame: &Frame<'_>) -> TransportResult<()>;
}

/// Configuration for a transport context.
///
/// Zero means "use the transport default" for every field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextConfig {
    /// Maximum size of a network packet in bytes
    pub max_packet_size: usize,
    /// Maximum size of a frame buffer in bytes
    pub max_frame_size: usize,
}

/// Channel layout of input frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSet {
    /// One channel
    Mono,
    /// Two interleaved channels, left first
    Stereo,
}

impl ChannelSet {
    /// Number of interleaved channels
    pub const fn count(self) -> usize {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

/// Sample encoding of input frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEncoding {
    /// Native-endian 32-bit float in the range [-1, 1]
    PcmFloat,
}

impl FrameEncoding {
    /// Size of one sample in bytes
    pub const fn sample_size(self) -> usize {
        match self {
            Self::PcmFloat => std::mem::size_of::<f32>(),
        }
    }
}

/// Who supplies the real-time clock for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSource {
    /// The caller paces writes itself; `write` never waits.
    External,
    /// The session paces writes against its own timer.
    Internal,
}

/// Configuration for a sending session. Immutable once the session is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Sample rate of input frames in Hz
    pub frame_sample_rate: u32,
    /// Channel layout of input frames
    pub frame_channels: ChannelSet,
    /// Sample encoding of input frames
    pub frame_encoding: FrameEncoding,
    /// Clock that paces `write`
    pub clock_source: ClockSource,
}

impl SessionConfig {
    /// Create configuration for internally clocked stereo float frames
    pub const fn stereo_float(sample_rate: u32) -> Self {
        Self {
            frame_sample_rate: sample_rate,
            frame_channels: ChannelSet::Stereo,
            frame_encoding: FrameEncoding::PcmFloat,
            clock_source: ClockSource::Internal,
        }
    }

    /// Size in bytes of one sample frame (one sample per channel)
    pub const fn bytes_per_frame(&self) -> usize {
        self.frame_channels.count() * self.frame_encoding.sample_size()
    }

    /// Check whether `byte_len` holds a whole, non-empty number of sample frames
    pub const fn accepts_byte_len(&self, byte_len: usize) -> bool {
        byte_len > 0 && byte_len % self.bytes_per_frame() == 0
    }
}

/// Logical sub-stream of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interface {
    /// Primary media packets
    AudioSource,
    /// Redundancy (FEC repair) packets
    AudioRepair,
}

impl Interface {
    /// Both interfaces, in the order the harness binds them
    pub const ALL: [Self; 2] = [Self::AudioSource, Self::AudioRepair];
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AudioSource => f.write_str("audio-source"),
            Self::AudioRepair => f.write_str("audio-repair"),
        }
    }
}

/// Network protocol carried by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Bare RTP, no FEC
    Rtp,
    /// RTP with Reed-Solomon (m=8) FECFRAME source payload ID
    RtpRs8mSource,
    /// Reed-Solomon (m=8) FECFRAME repair payload ID
    Rs8mRepair,
    /// RTP with LDPC-Staircase FECFRAME source payload ID
    RtpLdpcSource,
    /// LDPC-Staircase FECFRAME repair payload ID
    LdpcRepair,
}

impl Protocol {
    /// Interface this protocol may be bound to
    pub const fn interface(self) -> Interface {
        match self {
            Self::Rtp | Self::RtpRs8mSource | Self::RtpLdpcSource => Interface::AudioSource,
            Self::Rs8mRepair | Self::LdpcRepair => Interface::AudioRepair,
        }
    }

    /// URI scheme used when printing an endpoint
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Rtp => "rtp",
            Self::RtpRs8mSource => "rtp+rs8m",
            Self::Rs8mRepair => "rs8m",
            Self::RtpLdpcSource => "rtp+ldpc",
            Self::LdpcRepair => "ldpc",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// A borrowed view over one block of interleaved samples.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    bytes: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Wrap a block of interleaved float samples
    pub fn from_samples(samples: &'a [f32]) -> Self {
        Self {
            bytes: bytemuck::cast_slice(samples),
        }
    }

    /// Wrap raw bytes; the session validates their length on write
    pub const fn from_bytes(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Raw sample bytes
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Length of the frame in bytes
    pub const fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}
