//! Delivering script text to the target application.
//!
//! [`Deliver`] is the cross-process primitive; [`RetryingSender`] wraps one
//! with a single start-and-retry when the first attempt fails.

mod launch;
#[cfg(unix)]
mod message_file;

pub use launch::{default_launch_path, ProcessLauncher};
#[cfg(unix)]
pub use message_file::MessageFileChannel;

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why a command did not reach (or was not acknowledged by) the target.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Program {program} not running.")]
    NotRunning { program: String },
    #[error("Cannot write message for {program} to {}: {source}", .path.display())]
    MessageFile {
        program: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot send message to {program} (process {pid}): {source}")]
    Signal {
        program: String,
        pid: i32,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} did not answer within {} seconds.", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },
    #[error("Sending messages to {program} is not supported on this platform.")]
    Unsupported { program: String },
    #[error("{0}")]
    Failed(String),
}

/// Cross-process "run this script" primitive.
///
/// `timeout` of zero means fire-and-forget; otherwise the call waits up to
/// `timeout` for the target to acknowledge.
pub trait Deliver {
    fn send(&self, target: &str, timeout: Duration, text: &str) -> Result<(), DeliveryError>;
}

impl<D: Deliver + ?Sized> Deliver for &D {
    fn send(&self, target: &str, timeout: Duration, text: &str) -> Result<(), DeliveryError> {
        (**self).send(target, timeout, text)
    }
}

impl<D: Deliver + ?Sized> Deliver for Box<D> {
    fn send(&self, target: &str, timeout: Duration, text: &str) -> Result<(), DeliveryError> {
        (**self).send(target, timeout, text)
    }
}

/// Best-effort start of the target application. Failures are logged, never returned.
pub trait Launch {
    fn start(&self, target: &str);
}

/// Delivers through `channel`; on failure starts the target once and retries once.
#[derive(Debug, Clone)]
pub struct RetryingSender<D, L> {
    channel: D,
    launcher: L,
}

impl<D: Deliver, L: Launch> RetryingSender<D, L> {
    pub fn new(channel: D, launcher: L) -> Self {
        Self { channel, launcher }
    }
}

impl<D: Deliver, L: Launch> Deliver for RetryingSender<D, L> {
    fn send(&self, target: &str, timeout: Duration, text: &str) -> Result<(), DeliveryError> {
        match self.channel.send(target, timeout, text) {
            Ok(()) => {
                tracing::debug!(program = target, "delivered");
                Ok(())
            }
            Err(first) => {
                tracing::info!(program = target, "delivery failed ({}); starting target and retrying", first);
                self.launcher.start(target);
                let retried = self.channel.send(target, timeout, text);
                match &retried {
                    Ok(()) => tracing::debug!(program = target, "delivered on retry"),
                    Err(e) => tracing::warn!(program = target, "delivery failed after retry: {}", e),
                }
                retried
            }
        }
    }
}

/// Channel for platforms without a native implementation; every send fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedChannel;

impl Deliver for UnsupportedChannel {
    fn send(&self, target: &str, _timeout: Duration, _text: &str) -> Result<(), DeliveryError> {
        Err(DeliveryError::Unsupported {
            program: target.to_string(),
        })
    }
}

/// The native delivery channel for this platform.
#[cfg(unix)]
pub fn platform_channel() -> Box<dyn Deliver> {
    match MessageFileChannel::from_env() {
        Some(channel) => Box::new(channel),
        None => {
            tracing::warn!("HOME is not set; message delivery unavailable");
            Box::new(UnsupportedChannel)
        }
    }
}

/// The native delivery channel for this platform.
#[cfg(not(unix))]
pub fn platform_channel() -> Box<dyn Deliver> {
    Box::new(UnsupportedChannel)
}
