//! Argument handling: decide which of the invocation modes applies and run it.

mod commands;

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::time::Duration;
use websend_core::config::{self, WebsendConfig};
use websend_core::relay::RelayCommand;

use commands::{run_one_shot, run_relay, run_session, run_usage};

/// Prefix of the single-argument JSON request form.
pub const ONE_SHOT_SCHEME: &str = "websend://";
/// Chrome passes the caller's origin as the first argument.
pub const CHROME_ORIGIN_PREFIX: &str = "chrome-extension://";

const EXAMPLES: &str = "\
Examples:
  websend praat Quit
      Ask the running program \"praat\" to quit.
  websend 0 praat \"Play reverse\"
      Send without waiting for an acknowledgement.
  websend praat \"Read from file... https://example.com/a.wav\" \"Play\"
      Download a.wav first, then send the script with its local path.
  websend 'websend://{\"message\":\"send\",\"send\":[\"praat\",\"Quit\"]}'
      Process one JSON request and print the JSON reply.

When started by a browser (chrome-extension://... origin or a configured
Firefox extension id), requests are read as length-prefixed JSON frames
from stdin and replies written to stdout until stdin closes.";

/// Relay scripts to a running application, fetching remote files first.
#[derive(Debug, Parser)]
#[command(name = "websend", version)]
#[command(about = "websend: send scripts to a running program, with http(s) URLs resolved to local files", long_about = None)]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// Use this config file instead of ~/.config/websend/config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Serve length-prefixed JSON requests on stdin/stdout.
    #[arg(long)]
    pub session: bool,

    /// `[timeout] program line...`, a single `websend://{json}` request,
    /// or the arguments a browser passes to a native-messaging host.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    pub args: Vec<String>,
}

/// What this process was started to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Usage,
    /// JSON request body with the scheme prefix removed.
    OneShot(String),
    Session,
    Relay(RelayCommand),
}

impl Invocation {
    pub fn classify(cli: &Cli, firefox_ids: &[String], default_timeout: Duration) -> Result<Self> {
        if cli.session {
            return Ok(Invocation::Session);
        }
        let args = &cli.args;
        let Some(first) = args.first() else {
            return Ok(Invocation::Usage);
        };

        if args.len() == 1 {
            if let Some(json) = first.strip_prefix(ONE_SHOT_SCHEME) {
                return Ok(Invocation::OneShot(json.to_string()));
            }
        }

        // Firefox passes the manifest path first and the extension id second.
        let firefox = args.iter().take(2).any(|a| firefox_ids.iter().any(|id| id == a));
        if first.starts_with(CHROME_ORIGIN_PREFIX) || firefox {
            return Ok(Invocation::Session);
        }

        let mut rest = args.iter();
        let mut timeout = default_timeout;
        if !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit()) {
            let secs: u64 = first
                .parse()
                .with_context(|| format!("invalid timeout {first:?}"))?;
            timeout = Duration::from_secs(secs);
            rest.next();
        }
        let target = rest
            .next()
            .ok_or_else(|| anyhow!("missing program name. Type \"websend\" to get help."))?;

        Ok(Invocation::Relay(RelayCommand {
            timeout,
            target: target.clone(),
            lines: rest.cloned().collect(),
        }))
    }
}

fn load_config(cli: &Cli) -> WebsendConfig {
    let loaded = match &cli.config {
        Some(path) => config::load_or_init_at(path),
        None => config::load_or_init(),
    };
    loaded.unwrap_or_else(|err| {
        tracing::warn!("config unavailable, using defaults: {:#}", err);
        WebsendConfig::default()
    })
}

/// Parses the process arguments, runs the selected mode and returns the exit status.
pub fn run_from_args() -> Result<i32> {
    let cli = Cli::parse();
    let cfg = load_config(&cli);
    tracing::debug!("loaded config: {:?}", cfg);

    let invocation = Invocation::classify(
        &cli,
        &cfg.firefox_extension_ids,
        Duration::from_secs(cfg.default_relay_timeout_secs),
    )?;
    tracing::debug!(?invocation, "starting");

    match invocation {
        Invocation::Usage => run_usage(&mut Cli::command()),
        Invocation::OneShot(json) => run_one_shot(&cfg, &json),
        Invocation::Session => run_session(&cfg),
        Invocation::Relay(cmd) => run_relay(&cfg, &cmd),
    }
}

#[cfg(test)]
mod tests;
