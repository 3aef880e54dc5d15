//! Internal clock that releases frames at the real-time playback rate.

use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Schedules frame hand-off against wall-clock time.
///
/// The clock starts on the first frame. Frame `n` is due at
/// `start + (sample frames before n) / sample_rate`, so rounding never
/// accumulates across frames.
#[derive(Debug)]
pub struct Pacer {
    sample_rate: u32,
    start: Option<Instant>,
    scheduled: u64,
}

impl Pacer {
    /// Create a pacer for the given sample rate
    pub const fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            start: None,
            scheduled: 0,
        }
    }

    /// Offset from the clock start at which the next frame is due.
    pub fn next_offset(&self) -> Duration {
        offset_for(self.scheduled, self.sample_rate)
    }

    /// Number of sample frames scheduled so far
    pub const fn scheduled(&self) -> u64 {
        self.scheduled
    }

    /// Reserve a slot for `frames` sample frames and return its deadline.
    pub fn reserve(&mut self, frames: u64, now: Instant) -> Instant {
        let start = *self.start.get_or_insert(now);
        let deadline = start + self.next_offset();
        self.scheduled += frames;
        deadline
    }

    /// Wait until a block of `frames` sample frames may be handed off.
    pub async fn wait(&mut self, frames: u64) {
        let deadline = self.reserve(frames, Instant::now());
        if deadline > Instant::now() {
            tracing::trace!(scheduled = self.scheduled, "pacing write");
            sleep_until(deadline).await;
        }
    }
}

fn offset_for(frames: u64, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    let rate = u64::from(sample_rate);
    let secs = frames / rate;
    let nanos = (frames % rate) * 1_000_000_000 / rate;
    Duration::new(secs, nanos as u32)
}
