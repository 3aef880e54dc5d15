//! Error types for transport operations.

/// Transport-specific error types.
///
/// A transport call either succeeds or fails; these variants only say why,
/// for the one-line diagnostic the harness prints.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Network connectivity issues
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// A host/port pair did not resolve to any address
    #[error("Could not resolve {host}:{port}")]
    Resolve {
        /// Host that was looked up
        host: String,
        /// Port that was looked up
        port: u16,
    },

    /// An argument was rejected
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument {
        /// Name of the rejected argument
        argument: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// The handle is not in a state that allows the call
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A frame did not match the session's input format
    #[error("Malformed frame: {byte_len} bytes is not a whole number of {frame_size}-byte sample frames")]
    MalformedFrame {
        /// Length of the rejected frame
        byte_len: usize,
        /// Size of one sample frame in the session format
        frame_size: usize,
    },

    /// Resource allocation errors
    #[error("Resource allocation failed: {resource} - {reason}")]
    ResourceAllocation {
        /// Resource that could not be allocated
        resource: &'static str,
        /// Why allocation failed
        reason: String,
    },
}

impl TransportError {
    /// Create an invalid argument error
    pub fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(details: impl Into<String>) -> Self {
        Self::InvalidState(details.into())
    }

    /// Create a resource allocation error
    pub fn allocation(resource: &'static str, reason: impl Into<String>) -> Self {
        Self::ResourceAllocation {
            resource,
            reason: reason.into(),
        }
    }
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
