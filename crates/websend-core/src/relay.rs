//! Plain command relay: `[timeout] program line...` from the command line.

use crate::http::HttpClient;
use crate::progress::ProgressSink;
use crate::resolve::{DownloadError, Resolution};
use crate::sender::{Deliver, DeliveryError};
use crate::session::Session;
use std::time::Duration;
use thiserror::Error;

/// One relay invocation, already split out of the argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCommand {
    pub timeout: Duration,
    pub target: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),
    #[error("{0}")]
    Delivery(#[from] DeliveryError),
}

impl RelayError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RelayError::Download(_) => 600,
            RelayError::Delivery(_) => 1,
        }
    }
}

/// Downloads remote references in `cmd.lines` (without credentials) and
/// delivers the joined script. Downloaded files are left in place.
pub fn relay_command<C, S>(
    session: &mut Session,
    client: &C,
    sender: &S,
    cmd: &RelayCommand,
    sink: &mut dyn ProgressSink,
) -> Result<(), RelayError>
where
    C: HttpClient + ?Sized,
    S: Deliver + ?Sized,
{
    let mut lines = Vec::with_capacity(cmd.lines.len());
    for line in &cmd.lines {
        lines.push(session.resolve_line(client, line, None, sink, Resolution::Download)?);
    }
    sender.send(&cmd.target, cmd.timeout, &lines.join("\n"))?;
    Ok(())
}
