//! Deployment parameters for the sender harness.

use crate::error::{SenderError, SenderResult};
use crate::sender::EndpointSpec;
use crate::signal::SineParams;
use crate::transport::{ClockSource, ContextConfig, Interface, Protocol, SessionConfig};

/// Receiver address used by [`HarnessConfig::default`].
pub const DEFAULT_RECEIVER_HOST: &str = "127.0.0.1";
/// Receiver port for source (audio) packets.
pub const DEFAULT_SOURCE_PORT: u16 = 10001;
/// Receiver port for repair (FEC) packets.
pub const DEFAULT_REPAIR_PORT: u16 = 10002;
/// Input sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
/// Tone frequency in Hz.
pub const DEFAULT_SINE_RATE: f64 = 440.0;
/// Tone amplitude as a fraction of full scale.
pub const DEFAULT_AMPLITUDE: f32 = 0.1;
/// Length of the stream in seconds.
pub const DEFAULT_DURATION_SECS: u32 = 5;
/// Interleaved samples per write.
pub const DEFAULT_BLOCK_SIZE: usize = 100;

/// Everything the harness needs to open a session and stream the tone.
///
/// The sample budget is `sample_rate * duration_secs` interleaved samples,
/// written in blocks of `block_size`. The budget must split into whole
/// blocks; a short final block is never written.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    /// Receiver host name or address
    pub receiver_host: String,
    /// Receiver port for the source interface
    pub source_port: u16,
    /// Receiver port for the repair interface
    pub repair_port: u16,
    /// Protocol for the source interface
    pub source_protocol: Protocol,
    /// Protocol for the repair interface
    pub repair_protocol: Protocol,
    /// Input sample rate in Hz
    pub sample_rate: u32,
    /// Tone frequency in Hz
    pub sine_rate: f64,
    /// Tone amplitude as a fraction of full scale
    pub amplitude: f32,
    /// Length of the stream in seconds
    pub duration_secs: u32,
    /// Interleaved samples per write; must be even
    pub block_size: usize,
    /// Who paces the writes
    pub clock_source: ClockSource,
    /// Transport context limits
    pub context: ContextConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            receiver_host: DEFAULT_RECEIVER_HOST.to_string(),
            source_port: DEFAULT_SOURCE_PORT,
            repair_port: DEFAULT_REPAIR_PORT,
            source_protocol: Protocol::RtpRs8mSource,
            repair_protocol: Protocol::Rs8mRepair,
            sample_rate: DEFAULT_SAMPLE_RATE,
            sine_rate: DEFAULT_SINE_RATE,
            amplitude: DEFAULT_AMPLITUDE,
            duration_secs: DEFAULT_DURATION_SECS,
            block_size: DEFAULT_BLOCK_SIZE,
            clock_source: ClockSource::Internal,
            context: ContextConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Total interleaved samples to write
    pub const fn total_samples(&self) -> u64 {
        self.sample_rate as u64 * self.duration_secs as u64
    }

    /// Number of `write` calls needed for the sample budget
    pub const fn block_count(&self) -> u64 {
        if self.block_size == 0 {
            return 0;
        }
        self.total_samples() / self.block_size as u64
    }

    /// Input format handed to the session
    pub const fn session_config(&self) -> SessionConfig {
        SessionConfig {
            clock_source: self.clock_source,
            ..SessionConfig::stereo_float(self.sample_rate)
        }
    }

    /// Tone parameters for the signal generator
    pub const fn sine_params(&self) -> SineParams {
        SineParams {
            frequency: self.sine_rate,
            sample_rate: self.sample_rate,
            amplitude: self.amplitude,
        }
    }

    /// Destination for one interface
    pub fn endpoint(&self, interface: Interface) -> EndpointSpec {
        let (protocol, port) = match interface {
            Interface::AudioSource => (self.source_protocol, self.source_port),
            Interface::AudioRepair => (self.repair_protocol, self.repair_port),
        };
        EndpointSpec::new(protocol, self.receiver_host.clone(), port)
    }

    /// Check the configuration before anything is opened.
    pub fn validate(&self) -> SenderResult<()> {
        let invalid = |msg: String| Err(SenderError::InvalidConfig(msg));

        if self.receiver_host.is_empty() {
            return invalid("receiver_host must not be empty".to_string());
        }
        if self.source_port == 0 || self.repair_port == 0 {
            return invalid(format!(
                "ports must be non-zero (source {}, repair {})",
                self.source_port, self.repair_port
            ));
        }
        for interface in Interface::ALL {
            let protocol = self.endpoint(interface).protocol;
            if protocol.interface() != interface {
                return invalid(format!(
                    "protocol {protocol} cannot be used on the {interface} interface"
                ));
            }
        }
        if self.sample_rate == 0 {
            return invalid("sample_rate must be non-zero".to_string());
        }
        if !(self.sine_rate > 0.0) {
            return invalid(format!("sine_rate must be positive, got {}", self.sine_rate));
        }
        if !(self.amplitude > 0.0 && self.amplitude <= 1.0) {
            return invalid(format!(
                "amplitude must be in (0, 1], got {}",
                self.amplitude
            ));
        }
        if self.block_size == 0 || self.block_size % 2 != 0 {
            return invalid(format!(
                "block_size must be a positive even number of samples, got {}",
                self.block_size
            ));
        }
        if self.total_samples() % self.block_size as u64 != 0 {
            return invalid(format!(
                "sample budget {} does not split into blocks of {}",
                self.total_samples(),
                self.block_size
            ));
        }
        Ok(())
    }
}
