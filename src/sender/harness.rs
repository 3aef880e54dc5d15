//! Top-level driver: setup, stream, teardown.

use super::pump::{FramePump, StreamReport};
use super::session::SessionManager;
use crate::config::HarnessConfig;
use crate::error::SenderResult;
use crate::transport::{Interface, Transport};
use tracing::{error, info, warn};

/// Stream the configured tone through `transport` from start to finish.
///
/// Any failure stops the run. Whatever was already acquired is then released
/// in reverse order before the original error is returned.
pub async fn run<T: Transport>(transport: &T, config: &HarnessConfig) -> SenderResult<StreamReport> {
    config.validate()?;

    let mut manager = SessionManager::new(transport);
    match stream(&mut manager, config).await {
        Ok(report) => {
            info!(
                frames = report.frames_written,
                samples = report.samples_written,
                bytes = report.bytes_written,
                "stream complete"
            );
            Ok(report)
        }
        Err(err) => {
            error!(operation = err.operation(), state = %manager.state(), "stream aborted");
            if let Err(teardown) = manager.shutdown() {
                warn!(error = %teardown, "teardown after failure did not complete");
            }
            Err(err)
        }
    }
}

async fn stream<T: Transport>(
    manager: &mut SessionManager<'_, T>,
    config: &HarnessConfig,
) -> SenderResult<StreamReport> {
    manager.open_context(&config.context)?;
    manager.open_session(&config.session_config())?;

    for interface in Interface::ALL {
        manager.bind_interface(interface, &config.endpoint(interface))?;
    }

    let report = FramePump::new(config).run(manager).await?;

    manager.close_session()?;
    manager.close_context()?;
    Ok(report)
}
