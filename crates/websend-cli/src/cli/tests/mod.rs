//! CLI parse and mode-classification tests.

use super::{Cli, Invocation};
use clap::Parser;
use std::time::Duration;

pub(super) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub(super) fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

pub(super) fn classify(args: &[&str]) -> anyhow::Result<Invocation> {
    let firefox = vec!["@websend".to_string()];
    Invocation::classify(&parse(args), &firefox, DEFAULT_TIMEOUT)
}

mod classify;
