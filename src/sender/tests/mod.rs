//! Tests for the sender harness.
//!
//! Everything here runs against [`recording::RecordingTransport`], which logs
//! each transport call so ordering can be asserted directly.

use crate::config::HarnessConfig;
use crate::transport::ClockSource;

mod harness_tests;
mod recording;

/// Default deployment parameters with the transport's clock turned off
pub(crate) fn test_config() -> HarnessConfig {
    HarnessConfig {
        clock_source: ClockSource::External,
        ..HarnessConfig::default()
    }
}
