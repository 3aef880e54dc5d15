//! Frame pump: generates the tone block by block and writes it out.

use super::session::SessionManager;
use crate::config::HarnessConfig;
use crate::error::SenderResult;
use crate::signal::{SineParams, sine_block};
use crate::transport::{Frame, Transport};
use tracing::{debug, trace};

/// Totals for one completed stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamReport {
    /// Number of `write` calls made
    pub frames_written: u64,
    /// Interleaved samples written
    pub samples_written: u64,
    /// Bytes written
    pub bytes_written: u64,
}

/// Writes a fixed number of sine blocks to a session.
#[derive(Debug, Clone)]
pub struct FramePump {
    params: SineParams,
    block_size: usize,
    blocks: u64,
}

impl FramePump {
    /// Create a pump for the sample budget in `config`.
    pub const fn new(config: &HarnessConfig) -> Self {
        Self {
            params: config.sine_params(),
            block_size: config.block_size,
            blocks: config.block_count(),
        }
    }

    /// Number of blocks the pump will write
    pub const fn block_count(&self) -> u64 {
        self.blocks
    }

    /// Size in bytes of every frame the pump writes
    pub const fn frame_bytes(&self) -> usize {
        self.block_size * std::mem::size_of::<f32>()
    }

    /// Write every block in order, one blocking write at a time.
    ///
    /// Stops at the first failed write; nothing is retried.
    pub async fn run<T: Transport>(
        &self,
        session: &mut SessionManager<'_, T>,
    ) -> SenderResult<StreamReport> {
        debug!(
            blocks = self.blocks,
            block_size = self.block_size,
            "streaming started"
        );

        for index in 0..self.blocks {
            let samples = sine_block(index as usize, self.block_size, &self.params);
            session.write(&Frame::from_samples(&samples)).await?;
            trace!(index, "frame written");
        }

        let report = StreamReport {
            frames_written: self.blocks,
            samples_written: self.blocks * self.block_size as u64,
            bytes_written: self.blocks * self.frame_bytes() as u64,
        };
        debug!(?report, "streaming finished");
        Ok(report)
    }
}
