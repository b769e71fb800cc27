//! `websend [timeout] program line...`

use anyhow::Result;
use std::io;
use websend_core::config::WebsendConfig;
use websend_core::http::CurlClient;
use websend_core::progress::DotProgress;
use websend_core::relay::{relay_command, RelayCommand};
use websend_core::Session;

use super::retrying_sender;

/// Exits 600 on a download error and 1 when delivery fails. Downloads stay on disk.
pub fn run_relay(cfg: &WebsendConfig, cmd: &RelayCommand) -> Result<i32> {
    let mut session = Session::new(cfg.resolved_download_dir());
    let client = CurlClient::from_config(cfg);
    let sender = retrying_sender(cfg);
    let mut dots = DotProgress::new(io::stdout());

    match relay_command(&mut session, &client, &sender, cmd, &mut dots) {
        Ok(()) => Ok(0),
        Err(err) => {
            eprintln!("websend: {}", err);
            Ok(err.exit_code())
        }
    }
}
