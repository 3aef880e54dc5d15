//! Session manager: owns the context and the single sending session.

use super::endpoint::{EndpointGuard, EndpointSpec};
use crate::error::{SenderError, SenderResult};
use crate::transport::{
    ContextConfig, Frame, Interface, SessionConfig, Transport, TransportError,
};
use std::fmt;
use tracing::{debug, info, warn};

/// Lifecycle of a [`SessionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing is open yet
    Unopened,
    /// The context is open, no session yet
    ContextOpen,
    /// The session is open, no interface bound
    SessionOpen,
    /// At least one interface is bound
    Bound {
        /// Source interface bound
        source: bool,
        /// Repair interface bound
        repair: bool,
    },
    /// At least one frame has been written
    Streaming,
    /// The session is closed, the context is still open
    SessionClosed,
    /// Everything is closed
    Closed,
}

impl SessionState {
    /// Check whether both interfaces are bound and frames may be written
    pub const fn can_write(&self) -> bool {
        matches!(
            self,
            Self::Bound {
                source: true,
                repair: true
            } | Self::Streaming
        )
    }

    /// Check whether a session handle is held in this state
    pub const fn has_session(&self) -> bool {
        matches!(self, Self::SessionOpen | Self::Bound { .. } | Self::Streaming)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unopened => f.write_str("unopened"),
            Self::ContextOpen => f.write_str("context-open"),
            Self::SessionOpen => f.write_str("session-open"),
            Self::Bound { source, repair } => {
                let mut bound = Vec::with_capacity(2);
                if *source {
                    bound.push("source");
                }
                if *repair {
                    bound.push("repair");
                }
                write!(f, "bound ({})", bound.join(", "))
            }
            Self::Streaming => f.write_str("streaming"),
            Self::SessionClosed => f.write_str("session-closed"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// Drives one sending session through its lifecycle.
///
/// Acquisition runs context, session, interfaces; release runs in reverse.
/// Each call checks the current [`SessionState`] and refuses to run out of
/// order. Whatever is still held when the manager is dropped is released
/// then, session before context.
pub struct SessionManager<'t, T: Transport> {
    transport: &'t T,
    state: SessionState,
    context: Option<T::Context>,
    session: Option<T::Session>,
    session_config: Option<SessionConfig>,
    frames_written: u64,
    bytes_written: u64,
}

impl<'t, T: Transport> SessionManager<'t, T> {
    /// Create a manager with nothing opened.
    pub const fn new(transport: &'t T) -> Self {
        Self {
            transport,
            state: SessionState::Unopened,
            context: None,
            session: None,
            session_config: None,
            frames_written: 0,
            bytes_written: 0,
        }
    }

    /// Current lifecycle state
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Frames written so far
    pub const fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Bytes written so far
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Open the transport context.
    pub fn open_context(&mut self, config: &ContextConfig) -> SenderResult<()> {
        if self.state != SessionState::Unopened {
            return Err(SenderError::invalid_state("open_context", self.state));
        }

        let context = self
            .transport
            .open_context(config)
            .map_err(SenderError::ContextOpen)?;
        self.context = Some(context);
        self.state = SessionState::ContextOpen;
        debug!("context opened");
        Ok(())
    }

    /// Open the sending session from the context.
    pub fn open_session(&mut self, config: &SessionConfig) -> SenderResult<()> {
        let context = match (&self.state, &self.context) {
            (SessionState::ContextOpen, Some(context)) => context,
            _ => return Err(SenderError::invalid_state("open_session", self.state)),
        };

        let session = self
            .transport
            .open_session(context, config)
            .map_err(SenderError::SessionOpen)?;
        self.session = Some(session);
        self.session_config = Some(*config);
        self.state = SessionState::SessionOpen;
        info!(
            sample_rate = config.frame_sample_rate,
            channels = config.frame_channels.count(),
            clock = ?config.clock_source,
            "session opened"
        );
        Ok(())
    }

    /// Build an endpoint for `spec` and connect `interface` to it.
    ///
    /// The descriptor is released before returning, whether or not the bind
    /// succeeded.
    pub fn bind_interface(&mut self, interface: Interface, spec: &EndpointSpec) -> SenderResult<()> {
        let (source, repair) = match self.state {
            SessionState::SessionOpen => (false, false),
            SessionState::Bound { source, repair } => (source, repair),
            state => return Err(SenderError::invalid_state("bind_interface", state)),
        };
        let already_bound = match interface {
            Interface::AudioSource => source,
            Interface::AudioRepair => repair,
        };
        if already_bound {
            return Err(SenderError::Bind {
                interface,
                source: TransportError::invalid_state(format!(
                    "{interface} interface is already bound"
                )),
            });
        }
        let Some(session) = self.session.as_mut() else {
            return Err(SenderError::invalid_state("bind_interface", self.state));
        };

        let guard = EndpointGuard::build(self.transport, spec)?;
        let Some(endpoint) = guard.endpoint() else {
            return Err(SenderError::invalid_state("bind_interface", self.state));
        };
        self.transport
            .connect(session, interface, endpoint)
            .map_err(|source| SenderError::Bind { interface, source })?;

        // The transport holds the binding from here on, even if release fails
        self.state = SessionState::Bound {
            source: source || interface == Interface::AudioSource,
            repair: repair || interface == Interface::AudioRepair,
        };
        info!(%interface, endpoint = %spec, "interface bound");
        guard.release()
    }

    /// Write one frame; may wait for the session's clock.
    pub async fn write(&mut self, frame: &Frame<'_>) -> SenderResult<()> {
        if !self.state.can_write() {
            return Err(SenderError::invalid_state("write", self.state));
        }
        let (Some(session), Some(config)) = (self.session.as_mut(), self.session_config.as_ref())
        else {
            return Err(SenderError::invalid_state("write", self.state));
        };

        let index = self.frames_written;
        if !config.accepts_byte_len(frame.byte_len()) {
            return Err(SenderError::Write {
                frame: index,
                source: TransportError::MalformedFrame {
                    byte_len: frame.byte_len(),
                    frame_size: config.bytes_per_frame(),
                },
            });
        }

        self.transport
            .write(session, frame)
            .await
            .map_err(|source| SenderError::Write {
                frame: index,
                source,
            })?;

        self.frames_written += 1;
        self.bytes_written += frame.byte_len() as u64;
        self.state = SessionState::Streaming;
        Ok(())
    }

    /// Close the session. The context stays open.
    pub fn close_session(&mut self) -> SenderResult<()> {
        if !self.state.has_session() {
            return Err(SenderError::invalid_state("close_session", self.state));
        }
        let Some(session) = self.session.take() else {
            return Err(SenderError::invalid_state("close_session", self.state));
        };

        // The handle is consumed even if close fails
        self.state = SessionState::SessionClosed;
        self.transport
            .close_session(session)
            .map_err(SenderError::SessionClose)?;
        debug!(frames = self.frames_written, "session closed");
        Ok(())
    }

    /// Close the context. The session must already be closed.
    pub fn close_context(&mut self) -> SenderResult<()> {
        if !matches!(
            self.state,
            SessionState::ContextOpen | SessionState::SessionClosed
        ) {
            return Err(SenderError::invalid_state("close_context", self.state));
        }
        let Some(context) = self.context.take() else {
            return Err(SenderError::invalid_state("close_context", self.state));
        };

        self.state = SessionState::Closed;
        self.transport
            .close_context(context)
            .map_err(SenderError::ContextClose)?;
        debug!("context closed");
        Ok(())
    }

    /// Release whatever is still open, session first, then context.
    ///
    /// Both releases are attempted; the first failure is returned.
    pub fn shutdown(&mut self) -> SenderResult<()> {
        let mut first_error = None;

        if self.session.is_some() {
            if let Err(e) = self.close_session() {
                warn!(error = %e, "failed to close session during shutdown");
                first_error.get_or_insert(e);
            }
        }
        if self.context.is_some() {
            if let Err(e) = self.close_context() {
                warn!(error = %e, "failed to close context during shutdown");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<T: Transport> Drop for SessionManager<'_, T> {
    fn drop(&mut self) {
        if self.session.is_some() || self.context.is_some() {
            warn!(state = %self.state, "session manager dropped with open resources");
            let _ = self.shutdown();
        }
    }
}
