//! UDP sending transport with an internal pacing clock.
//!
//! Each interface gets its own unconnected socket and sends with `send_to`; a
//! receiver that is not listening only loses datagrams. Source frames are split into
//! datagrams laid out as `[sequence:4][timestamp:8][samples...]` in native
//! byte order. The repair interface is connected and validated but carries no
//! traffic: this transport does not produce FEC repair packets.

use crate::transport::{
    error::{TransportError, TransportResult},
    pacing::Pacer,
    traits::{ClockSource, ContextConfig, Frame, Interface, Protocol, SessionConfig, Transport},
};
use parking_lot::Mutex;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, info};

/// Packet size used when the context config leaves it at zero.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 2048;

/// Frame size used when the context config leaves it at zero.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16384;

/// Length of the per-packet header: sequence (u32) then timestamp (u64).
pub const PACKET_HEADER_LEN: usize = 12;

/// Transport that sends raw PCM datagrams over UDP.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpTransport;

impl UdpTransport {
    /// Create a new UDP transport.
    pub const fn new() -> Self {
        Self
    }
}

#[derive(Debug)]
struct ContextShared {
    max_packet_size: usize,
    max_frame_size: usize,
    sessions: Mutex<SessionRegistry>,
}

#[derive(Debug, Default)]
struct SessionRegistry {
    open: usize,
    next_id: u64,
}

/// Shared resources for UDP sessions.
#[derive(Debug)]
pub struct UdpContext {
    shared: Arc<ContextShared>,
}

impl UdpContext {
    /// Maximum datagram size for sessions opened from this context
    pub fn max_packet_size(&self) -> usize {
        self.shared.max_packet_size
    }

    /// Number of sessions opened from this context and not yet closed
    pub fn open_sessions(&self) -> usize {
        self.shared.sessions.lock().open
    }
}

/// Destination descriptor for one interface.
#[derive(Debug, Clone, Default)]
pub struct UdpEndpoint {
    protocol: Option<Protocol>,
    host: Option<String>,
    port: Option<u16>,
}

impl UdpEndpoint {
    fn resolve(&self) -> TransportResult<(Protocol, SocketAddr)> {
        let protocol = self
            .protocol
            .ok_or_else(|| TransportError::invalid_argument("endpoint", "protocol is not set"))?;
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| TransportError::invalid_argument("endpoint", "host is not set"))?;
        let port = match self.port {
            Some(0) => {
                return Err(TransportError::invalid_argument(
                    "endpoint",
                    "port 0 cannot be connected to",
                ));
            }
            Some(port) => port,
            None => return Err(TransportError::invalid_argument("endpoint", "port is not set")),
        };

        let peer = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| TransportError::Resolve {
                host: host.to_string(),
                port,
            })?;
        Ok((protocol, peer))
    }
}

/// A bound interface of a session.
#[derive(Debug)]
struct Link {
    protocol: Protocol,
    peer: SocketAddr,
    // Converted to a tokio socket on first use, inside the runtime.
    pending: Option<std::net::UdpSocket>,
    socket: Option<UdpSocket>,
}

impl Link {
    fn open(protocol: Protocol, peer: SocketAddr) -> io::Result<Self> {
        let local: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = std::net::UdpSocket::bind(local)?;
        socket.set_nonblocking(true)?;

        Ok(Self {
            protocol,
            peer,
            pending: Some(socket),
            socket: None,
        })
    }

    fn socket(&mut self) -> io::Result<&UdpSocket> {
        if let Some(socket) = self.pending.take() {
            self.socket = Some(UdpSocket::from_std(socket)?);
        }
        self.socket
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "link has no socket"))
    }
}

/// One outbound UDP audio stream.
#[derive(Debug)]
pub struct UdpSession {
    id: u64,
    context: Arc<ContextShared>,
    config: SessionConfig,
    source: Option<Link>,
    repair: Option<Link>,
    pacer: Pacer,
    sequence: u32,
    timestamp: u64,
    packets_sent: u64,
    bytes_sent: u64,
}

impl UdpSession {
    /// Input format this session was opened with
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of datagrams sent so far
    pub const fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    /// Number of payload bytes sent so far, headers excluded
    pub const fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Check whether an interface has been connected
    pub const fn is_connected(&self, interface: Interface) -> bool {
        match interface {
            Interface::AudioSource => self.source.is_some(),
            Interface::AudioRepair => self.repair.is_some(),
        }
    }

    /// Remote address an interface is connected to
    pub fn peer(&self, interface: Interface) -> Option<SocketAddr> {
        self.link(interface).map(|link| link.peer)
    }

    fn link(&self, interface: Interface) -> Option<&Link> {
        match interface {
            Interface::AudioSource => self.source.as_ref(),
            Interface::AudioRepair => self.repair.as_ref(),
        }
    }

    fn link_slot(&mut self, interface: Interface) -> &mut Option<Link> {
        match interface {
            Interface::AudioSource => &mut self.source,
            Interface::AudioRepair => &mut self.repair,
        }
    }

    /// Largest frame-aligned payload that fits in one datagram.
    fn payload_capacity(&self) -> usize {
        let frame_size = self.config.bytes_per_frame();
        (self.context.max_packet_size - PACKET_HEADER_LEN) / frame_size * frame_size
    }

    async fn send_packets(&mut self, bytes: &[u8]) -> TransportResult<()> {
        let frame_size = self.config.bytes_per_frame();
        let capacity = self.payload_capacity();
        let link = self.source.as_mut().ok_or_else(|| {
            TransportError::invalid_state("audio-source interface is not connected")
        })?;
        let peer = link.peer;
        let socket = link.socket()?;

        let mut packet = Vec::with_capacity(PACKET_HEADER_LEN + capacity);
        for chunk in bytes.chunks(capacity) {
            packet.clear();
            packet.extend_from_slice(&self.sequence.to_ne_bytes());
            packet.extend_from_slice(&self.timestamp.to_ne_bytes());
            packet.extend_from_slice(chunk);

            socket.send_to(&packet, peer).await?;

            self.sequence = self.sequence.wrapping_add(1);
            self.timestamp += (chunk.len() / frame_size) as u64;
            self.packets_sent += 1;
            self.bytes_sent += chunk.len() as u64;
        }
        Ok(())
    }
}

impl Drop for UdpSession {
    fn drop(&mut self) {
        let mut sessions = self.context.sessions.lock();
        sessions.open = sessions.open.saturating_sub(1);
    }
}

fn fec_family(protocol: Protocol) -> &'static str {
    match protocol {
        Protocol::Rtp => "none",
        Protocol::RtpRs8mSource | Protocol::Rs8mRepair => "rs8m",
        Protocol::RtpLdpcSource | Protocol::LdpcRepair => "ldpc",
    }
}

impl Transport for UdpTransport {
    type Context = UdpContext;
    type Session = UdpSession;
    type Endpoint = UdpEndpoint;

    fn open_context(&self, config: &ContextConfig) -> TransportResult<UdpContext> {
        let max_packet_size = match config.max_packet_size {
            0 => DEFAULT_MAX_PACKET_SIZE,
            size if size <= PACKET_HEADER_LEN => {
                return Err(TransportError::invalid_argument(
                    "max_packet_size",
                    format!("{size} bytes leaves no room after the {PACKET_HEADER_LEN}-byte header"),
                ));
            }
            size => size,
        };
        let max_frame_size = match config.max_frame_size {
            0 => DEFAULT_MAX_FRAME_SIZE,
            size => size,
        };

        debug!(max_packet_size, max_frame_size, "opened udp context");
        Ok(UdpContext {
            shared: Arc::new(ContextShared {
                max_packet_size,
                max_frame_size,
                sessions: Mutex::new(SessionRegistry::default()),
            }),
        })
    }

    fn close_context(&self, context: UdpContext) -> TransportResult<()> {
        let open = context.open_sessions();
        if open > 0 {
            return Err(TransportError::invalid_state(format!(
                "context still has {open} open session(s)"
            )));
        }
        debug!("closed udp context");
        Ok(())
    }

    fn open_session(
        &self,
        context: &UdpContext,
        config: &SessionConfig,
    ) -> TransportResult<UdpSession> {
        if config.frame_sample_rate == 0 {
            return Err(TransportError::invalid_argument(
                "frame_sample_rate",
                "must be non-zero",
            ));
        }
        let frame_size = config.bytes_per_frame();
        if context.shared.max_packet_size - PACKET_HEADER_LEN < frame_size {
            return Err(TransportError::allocation(
                "packet",
                format!(
                    "max_packet_size {} cannot carry one {frame_size}-byte sample frame",
                    context.shared.max_packet_size
                ),
            ));
        }

        let id = {
            let mut sessions = context.shared.sessions.lock();
            sessions.open += 1;
            sessions.next_id += 1;
            sessions.next_id
        };

        debug!(
            id,
            sample_rate = config.frame_sample_rate,
            channels = config.frame_channels.count(),
            clock = ?config.clock_source,
            "opened udp session"
        );
        Ok(UdpSession {
            id,
            context: Arc::clone(&context.shared),
            config: *config,
            source: None,
            repair: None,
            pacer: Pacer::new(config.frame_sample_rate),
            sequence: 0,
            timestamp: 0,
            packets_sent: 0,
            bytes_sent: 0,
        })
    }

    fn close_session(&self, session: UdpSession) -> TransportResult<()> {
        debug!(
            id = session.id,
            packets = session.packets_sent,
            bytes = session.bytes_sent,
            "closed udp session"
        );
        Ok(())
    }

    fn allocate_endpoint(&self) -> TransportResult<UdpEndpoint> {
        Ok(UdpEndpoint::default())
    }

    fn set_protocol(&self, endpoint: &mut UdpEndpoint, protocol: Protocol) -> TransportResult<()> {
        endpoint.protocol = Some(protocol);
        Ok(())
    }

    fn set_host(&self, endpoint: &mut UdpEndpoint, host: &str) -> TransportResult<()> {
        if host.is_empty() {
            return Err(TransportError::invalid_argument("host", "must not be empty"));
        }
        endpoint.host = Some(host.to_string());
        Ok(())
    }

    fn set_port(&self, endpoint: &mut UdpEndpoint, port: u16) -> TransportResult<()> {
        endpoint.port = Some(port);
        Ok(())
    }

    fn deallocate_endpoint(&self, endpoint: UdpEndpoint) -> TransportResult<()> {
        drop(endpoint);
        Ok(())
    }

    fn connect(
        &self,
        session: &mut UdpSession,
        interface: Interface,
        endpoint: &UdpEndpoint,
    ) -> TransportResult<()> {
        if session.is_connected(interface) {
            return Err(TransportError::invalid_state(format!(
                "{interface} interface is already connected"
            )));
        }

        let (protocol, peer) = endpoint.resolve()?;
        if protocol.interface() != interface {
            return Err(TransportError::invalid_argument(
                "protocol",
                format!("{protocol} cannot be used on the {interface} interface"),
            ));
        }

        let counterpart = match interface {
            Interface::AudioSource => Interface::AudioRepair,
            Interface::AudioRepair => Interface::AudioSource,
        };
        if let Some(other) = session.link(counterpart) {
            if fec_family(other.protocol) != fec_family(protocol) {
                return Err(TransportError::invalid_argument(
                    "protocol",
                    format!("{protocol} does not match {} on the {counterpart} interface", other.protocol),
                ));
            }
        }

        let link = Link::open(protocol, peer)?;
        *session.link_slot(interface) = Some(link);

        info!(id = session.id, %interface, %protocol, %peer, "connected interface");
        Ok(())
    }

    async fn write(&self, session: &mut UdpSession, frame: &Frame<'_>) -> TransportResult<()> {
        let frame_size = session.config.bytes_per_frame();
        if !session.config.accepts_byte_len(frame.byte_len()) {
            return Err(TransportError::MalformedFrame {
                byte_len: frame.byte_len(),
                frame_size,
            });
        }
        if frame.byte_len() > session.context.max_frame_size {
            return Err(TransportError::invalid_argument(
                "frame",
                format!(
                    "{} bytes exceeds max_frame_size {}",
                    frame.byte_len(),
                    session.context.max_frame_size
                ),
            ));
        }
        if !session.is_connected(Interface::AudioSource) {
            return Err(TransportError::invalid_state(
                "audio-source interface is not connected",
            ));
        }

        if session.config.clock_source == ClockSource::Internal {
            let frames = (frame.byte_len() / frame_size) as u64;
            session.pacer.wait(frames).await;
        }

        session.send_packets(frame.as_bytes()).await
    }
}
