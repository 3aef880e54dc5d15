// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::let_unit_value)] // Avoids binding `()` to variables
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![cfg_attr(not(test), warn(clippy::unwrap_used))] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![allow(async_fn_in_trait)] // Transports are used generically, never as `dyn`
#![deny(missing_docs)] // Documentation is a must for release

//! # sine_sender
//!
//! A demonstration sender that generates a stereo sine tone and streams it,
//! in real time, to a remote receiver over an audio transport session.
//!
//! ## Overview
//!
//! The crate exercises the full lifecycle of a sending session:
//!
//! - open a transport context and a session with a stereo float input format
//! - build one endpoint descriptor per interface (source and repair), bind
//!   it, release it
//! - generate the tone block by block and write each block; the session's
//!   internal clock paces the writes
//! - close the session, then the context
//!
//! The transport is abstracted by [`Transport`]. The `udp` feature (on by
//! default) provides [`UdpTransport`], which sends raw PCM datagrams.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sine_sender::{HarnessConfig, UdpTransport, sender};
//!
//! let runtime = tokio::runtime::Builder::new_current_thread()
//!     .enable_all()
//!     .build()
//!     .unwrap();
//! let report = runtime
//!     .block_on(sender::run(&UdpTransport::new(), &HarnessConfig::default()))
//!     .unwrap();
//! assert_eq!(report.frames_written, 2205);
//! ```
//!
//! ## Error Handling
//!
//! Every setup and streaming step returns a [`SenderResult`]. There is no
//! recovery: the first failure stops the run, already-acquired resources are
//! released in reverse order, and the error names the failed operation.
//!
//! ```rust
//! use sine_sender::{HarnessConfig, SenderError};
//!
//! let config = HarnessConfig { block_size: 99, ..Default::default() };
//! match config.validate() {
//!     Err(SenderError::InvalidConfig(msg)) => eprintln!("oops: {msg}"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

pub mod config;
mod error;
pub mod sender;
pub mod signal;
pub mod transport;

pub use crate::config::HarnessConfig;
pub use crate::error::{SenderError, SenderResult};
pub use crate::sender::{SessionManager, SessionState, StreamReport};
pub use crate::signal::{SineParams, fill_sine_block, sine_block};
pub use crate::transport::{
    ChannelSet, ClockSource, ContextConfig, Frame, FrameEncoding, Interface, Protocol,
    SessionConfig, Transport, TransportError, TransportResult,
};

#[cfg(feature = "udp")]
pub use crate::transport::UdpTransport;
