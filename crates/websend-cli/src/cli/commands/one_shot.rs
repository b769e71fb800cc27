//! `websend 'websend://{json}'`: one request, reply printed to stdout.

use anyhow::Result;
use std::io::{self, Write};
use websend_core::config::WebsendConfig;
use websend_core::http::CurlClient;
use websend_core::progress::JsonLineProgress;
use websend_core::Dispatcher;

use super::retrying_sender;

/// Always exits 0; failures are reported in the reply's `code`.
pub fn run_one_shot(cfg: &WebsendConfig, json: &str) -> Result<i32> {
    let mut dispatcher = Dispatcher::from_config(cfg, CurlClient::from_config(cfg), retrying_sender(cfg));
    let mut progress = JsonLineProgress::new(io::stdout(), dispatcher.correlation());
    let reply = dispatcher.handle(json.as_bytes(), &mut progress);

    let mut out = io::stdout().lock();
    out.write_all(&reply)?;
    writeln!(out)?;
    out.flush()?;
    Ok(0)
}
