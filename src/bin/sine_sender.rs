//! Sine wave sender.
//!
//! Generates a stereo 440 Hz tone and streams it to the receiver at
//! 127.0.0.1 (source packets on port 10001, repair packets on 10002).
//! All parameters are fixed; there are no flags or environment variables.

use std::process::ExitCode;

use sine_sender::{HarnessConfig, UdpTransport, sender};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("oops: logging setup: {e}");
        return ExitCode::FAILURE;
    }

    info!("sine_sender {} starting", env!("CARGO_PKG_VERSION"));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("oops: runtime setup: {e}");
            return ExitCode::FAILURE;
        }
    };

    let config = HarnessConfig::default();
    match runtime.block_on(sender::run(&UdpTransport::new(), &config)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(operation = err.operation(), "sender failed");
            eprintln!("oops: {err}");
            ExitCode::FAILURE
        }
    }
}
