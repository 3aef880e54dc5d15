//! Error types and result utilities for the sender harness.

use crate::sender::SessionState;
use crate::transport::{Interface, TransportError};
use thiserror::Error;

/// Convenience type alias for results that may contain SenderError
pub type SenderResult<T> = Result<T, SenderError>;

/// Error types that can occur while setting up or driving a sending session.
///
/// Every variant names the operation that failed. There is no recovery path:
/// a failure anywhere aborts the run after releasing what was acquired.
#[derive(Error, Debug)]
pub enum SenderError {
    /// The harness configuration was rejected before anything was opened.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The transport context could not be opened.
    #[error("context_open failed: {0}")]
    ContextOpen(#[source] TransportError),

    /// The sending session could not be opened.
    #[error("sender_open failed: {0}")]
    SessionOpen(#[source] TransportError),

    /// An endpoint descriptor could not be allocated.
    #[error("endpoint_allocate failed: {0}")]
    EndpointAllocate(#[source] TransportError),

    /// One of the endpoint setters rejected its value.
    #[error("{operation} failed: {source}")]
    EndpointConfigure {
        /// Setter that failed, e.g. `endpoint_set_host`.
        operation: &'static str,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// An endpoint descriptor could not be released.
    #[error("endpoint_deallocate failed: {0}")]
    EndpointDeallocate(#[source] TransportError),

    /// The session refused to connect an interface to its endpoint.
    #[error("sender_connect failed for {interface} interface: {source}")]
    Bind {
        /// Interface that was being bound.
        interface: Interface,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// Writing a frame to the session failed.
    #[error("sender_write failed at frame {frame}: {source}")]
    Write {
        /// Zero-based index of the frame that failed.
        frame: u64,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The session could not be closed.
    #[error("sender_close failed: {0}")]
    SessionClose(#[source] TransportError),

    /// The context could not be closed.
    #[error("context_close failed: {0}")]
    ContextClose(#[source] TransportError),

    /// An operation was attempted out of order.
    #[error("cannot {operation} while session is {state}")]
    InvalidState {
        /// Operation that was refused.
        operation: &'static str,
        /// State the session manager was in.
        state: SessionState,
    },
}

impl SenderError {
    /// Create an invalid state error
    pub const fn invalid_state(operation: &'static str, state: SessionState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Name of the operation that failed.
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "config_validate",
            Self::ContextOpen(_) => "context_open",
            Self::SessionOpen(_) => "sender_open",
            Self::EndpointAllocate(_) => "endpoint_allocate",
            Self::EndpointConfigure { operation, .. } => *operation,
            Self::EndpointDeallocate(_) => "endpoint_deallocate",
            Self::Bind { .. } => "sender_connect",
            Self::Write { .. } => "sender_write",
            Self::SessionClose(_) => "sender_close",
            Self::ContextClose(_) => "context_close",
            Self::InvalidState { operation, .. } => *operation,
        }
    }

    /// Check whether the failure happened before any frame was written.
    pub const fn is_setup_failure(&self) -> bool {
        !matches!(
            self,
            Self::Write { .. } | Self::SessionClose(_) | Self::ContextClose(_)
        )
    }
}
