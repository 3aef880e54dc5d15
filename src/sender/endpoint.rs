//! Endpoint descriptors with guaranteed release.

use crate::error::{SenderError, SenderResult};
use crate::transport::{Protocol, Transport};
use std::fmt;
use tracing::{trace, warn};

/// Where one interface's packets go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    /// Protocol carried on this endpoint
    pub protocol: Protocol,
    /// Receiver host name or address
    pub host: String,
    /// Receiver port
    pub port: u16,
}

impl EndpointSpec {
    /// Create a new endpoint description
    pub fn new(protocol: Protocol, host: impl Into<String>, port: u16) -> Self {
        Self {
            protocol,
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for EndpointSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// Owns an allocated endpoint descriptor until it is released.
///
/// [`release`](Self::release) deallocates and reports failure. Any other exit
/// path, including an early return on a failed setter or bind, deallocates in
/// `Drop` and only logs.
pub struct EndpointGuard<'t, T: Transport> {
    transport: &'t T,
    endpoint: Option<T::Endpoint>,
}

impl<'t, T: Transport> EndpointGuard<'t, T> {
    /// Allocate an empty descriptor.
    pub fn allocate(transport: &'t T) -> SenderResult<Self> {
        let endpoint = transport
            .allocate_endpoint()
            .map_err(SenderError::EndpointAllocate)?;
        trace!("allocated endpoint");
        Ok(Self {
            transport,
            endpoint: Some(endpoint),
        })
    }

    /// Allocate a descriptor and fill in protocol, host and port.
    pub fn build(transport: &'t T, spec: &EndpointSpec) -> SenderResult<Self> {
        let mut guard = Self::allocate(transport)?;
        guard.configure(spec)?;
        Ok(guard)
    }

    fn configure(&mut self, spec: &EndpointSpec) -> SenderResult<()> {
        let transport = self.transport;
        let Some(endpoint) = self.endpoint.as_mut() else {
            return Ok(());
        };

        transport
            .set_protocol(endpoint, spec.protocol)
            .map_err(|source| SenderError::EndpointConfigure {
                operation: "endpoint_set_protocol",
                source,
            })?;
        transport
            .set_host(endpoint, &spec.host)
            .map_err(|source| SenderError::EndpointConfigure {
                operation: "endpoint_set_host",
                source,
            })?;
        transport
            .set_port(endpoint, spec.port)
            .map_err(|source| SenderError::EndpointConfigure {
                operation: "endpoint_set_port",
                source,
            })?;
        Ok(())
    }

    /// The descriptor, for handing to a bind call.
    pub fn endpoint(&self) -> Option<&T::Endpoint> {
        self.endpoint.as_ref()
    }

    /// Deallocate the descriptor now.
    pub fn release(mut self) -> SenderResult<()> {
        match self.endpoint.take() {
            Some(endpoint) => self
                .transport
                .deallocate_endpoint(endpoint)
                .map_err(SenderError::EndpointDeallocate),
            None => Ok(()),
        }
    }
}

impl<T: Transport> Drop for EndpointGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(endpoint) = self.endpoint.take() {
            if let Err(e) = self.transport.deallocate_endpoint(endpoint) {
                warn!(error = %e, "failed to release endpoint");
            }
        }
    }
}
