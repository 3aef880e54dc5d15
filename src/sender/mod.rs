//! Sender harness: session setup, the frame pump and orderly teardown.
//!
//! The flow is fixed:
//!
//! 1. open a context and a session with a stereo float input format
//! 2. bind the source and repair interfaces, each through a short-lived
//!    endpoint descriptor
//! 3. write the sine tone block by block; the session paces the writes
//! 4. close the session, then the context
//!
//! ```rust,ignore
//! use sine_sender::{HarnessConfig, UdpTransport, sender};
//!
//! let report = sender::run(&UdpTransport::new(), &HarnessConfig::default()).await?;
//! assert_eq!(report.frames_written, 2205);
//! ```

pub mod endpoint;
pub mod harness;
pub mod pump;
pub mod session;

#[cfg(test)]
mod tests;

pub use endpoint::{EndpointGuard, EndpointSpec};
pub use harness::run;
pub use pump::{FramePump, StreamReport};
pub use session::{SessionManager, SessionState};
