//! A transport that records every call and can fail on demand.

use crate::transport::{
    ContextConfig, Frame, Interface, Protocol, SessionConfig, Transport, TransportError,
    TransportResult,
};
use parking_lot::Mutex;

/// One call made against the transport, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    OpenContext,
    CloseContext,
    OpenSession,
    CloseSession,
    AllocateEndpoint(usize),
    SetProtocol(usize, Protocol),
    SetHost(usize, String),
    SetPort(usize, u16),
    DeallocateEndpoint(usize),
    Connect(Interface, usize),
    Write(usize),
}

/// The call that should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    OpenContext,
    OpenSession,
    AllocateEndpoint,
    SetHost,
    DeallocateEndpoint,
    Connect(Interface),
    /// Fail the write with this zero-based index
    Write(usize),
    CloseSession,
    CloseContext,
}

#[derive(Debug)]
pub(crate) struct RecordedContext;

#[derive(Debug)]
pub(crate) struct RecordedSession {
    writes: usize,
}

#[derive(Debug)]
pub(crate) struct RecordedEndpoint {
    id: usize,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    payloads: Mutex<Vec<Vec<f32>>>,
    next_endpoint: Mutex<usize>,
    fault: Option<Fault>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_on(fault: Fault) -> Self {
        Self {
            fault: Some(fault),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Byte lengths of every attempted write
    pub(crate) fn writes(&self) -> Vec<usize> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Write(len) => Some(*len),
                _ => None,
            })
            .collect()
    }

    /// Samples carried by the write with this zero-based index
    pub(crate) fn payload(&self, index: usize) -> Option<Vec<f32>> {
        self.payloads.lock().get(index).cloned()
    }

    pub(crate) fn position(&self, call: &Call) -> Option<usize> {
        self.calls.lock().iter().position(|c| c == call)
    }

    pub(crate) fn count(&self, call: &Call) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: Call, fault: Fault) -> TransportResult<()> {
        self.calls.lock().push(call);
        if self.fault == Some(fault) {
            return Err(TransportError::invalid_state(format!("injected {fault:?}")));
        }
        Ok(())
    }
}

impl Transport for RecordingTransport {
    type Context = RecordedContext;
    type Session = RecordedSession;
    type Endpoint = RecordedEndpoint;

    fn open_context(&self, _config: &ContextConfig) -> TransportResult<RecordedContext> {
        self.record(Call::OpenContext, Fault::OpenContext)?;
        Ok(RecordedContext)
    }

    fn close_context(&self, _context: RecordedContext) -> TransportResult<()> {
        self.record(Call::CloseContext, Fault::CloseContext)
    }

    fn open_session(
        &self,
        _context: &RecordedContext,
        _config: &SessionConfig,
    ) -> TransportResult<RecordedSession> {
        self.record(Call::OpenSession, Fault::OpenSession)?;
        Ok(RecordedSession { writes: 0 })
    }

    fn close_session(&self, _session: RecordedSession) -> TransportResult<()> {
        self.record(Call::CloseSession, Fault::CloseSession)
    }

    fn allocate_endpoint(&self) -> TransportResult<RecordedEndpoint> {
        let id = {
            let mut next = self.next_endpoint.lock();
            let id = *next;
            *next += 1;
            id
        };
        self.record(Call::AllocateEndpoint(id), Fault::AllocateEndpoint)?;
        Ok(RecordedEndpoint { id })
    }

    fn set_protocol(
        &self,
        endpoint: &mut RecordedEndpoint,
        protocol: Protocol,
    ) -> TransportResult<()> {
        self.calls
            .lock()
            .push(Call::SetProtocol(endpoint.id, protocol));
        Ok(())
    }

    fn set_host(&self, endpoint: &mut RecordedEndpoint, host: &str) -> TransportResult<()> {
        self.record(Call::SetHost(endpoint.id, host.to_string()), Fault::SetHost)
    }

    fn set_port(&self, endpoint: &mut RecordedEndpoint, port: u16) -> TransportResult<()> {
        self.calls.lock().push(Call::SetPort(endpoint.id, port));
        Ok(())
    }

    fn deallocate_endpoint(&self, endpoint: RecordedEndpoint) -> TransportResult<()> {
        self.record(
            Call::DeallocateEndpoint(endpoint.id),
            Fault::DeallocateEndpoint,
        )
    }

    fn connect(
        &self,
        _session: &mut RecordedSession,
        interface: Interface,
        endpoint: &RecordedEndpoint,
    ) -> TransportResult<()> {
        self.record(
            Call::Connect(interface, endpoint.id),
            Fault::Connect(interface),
        )
    }

    async fn write(&self, session: &mut RecordedSession, frame: &Frame<'_>) -> TransportResult<()> {
        let index = session.writes;
        session.writes += 1;
        self.payloads
            .lock()
            .push(bytemuck::pod_collect_to_vec(frame.as_bytes()));
        self.record(Call::Write(frame.byte_len()), Fault::Write(index))
    }
}
