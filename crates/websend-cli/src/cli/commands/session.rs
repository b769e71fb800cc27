//! Native-messaging host: framed requests on stdin, frames out on stdout.

use anyhow::Result;
use std::io;
use websend_core::config::WebsendConfig;
use websend_core::http::CurlClient;
use websend_core::transport::{self, SessionEnd};
use websend_core::Dispatcher;

use super::retrying_sender;

/// Runs until stdin closes, then exits with status 1.
pub fn run_session(cfg: &WebsendConfig) -> Result<i32> {
    let mut dispatcher = Dispatcher::from_config(cfg, CurlClient::from_config(cfg), retrying_sender(cfg));
    let stdin = io::stdin();
    let stdout = io::stdout();

    let end = transport::run_session(&mut stdin.lock(), &mut stdout.lock(), &mut dispatcher);
    if let SessionEnd::ReadFailed(e) | SessionEnd::WriteFailed(e) = &end {
        eprintln!("websend: session ended: {}", e);
    }
    Ok(1)
}
