//! `websend` with no arguments: print help.

use anyhow::Result;

pub fn run_usage(cmd: &mut clap::Command) -> Result<i32> {
    cmd.print_long_help()?;
    Ok(0)
}
