//! Starting the target application when it is not running.

use super::Launch;
use crate::config::WebsendConfig;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// Executable to start for `target` when none is configured.
///
/// On macOS a Praat target maps to the standard application bundle; everywhere
/// else the target name itself is looked up on `PATH`.
pub fn default_launch_path(target: &str) -> PathBuf {
    if cfg!(target_os = "macos") && target.eq_ignore_ascii_case("praat") {
        return PathBuf::from("/Applications/Praat.app/Contents/MacOS/Praat");
    }
    PathBuf::from(target)
}

/// Spawns the target as a detached child, then waits a grace period for it to come up.
///
/// The child's stdio is detached: stdout may be carrying native-messaging frames.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    path: Option<PathBuf>,
    grace: Duration,
}

impl ProcessLauncher {
    pub fn new(path: Option<PathBuf>, grace: Duration) -> Self {
        Self { path, grace }
    }

    pub fn from_config(cfg: &WebsendConfig) -> Self {
        Self::new(cfg.launch_path.clone(), cfg.launch_grace())
    }

    /// Executable used for `target`.
    pub fn program_for(&self, target: &str) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| default_launch_path(target))
    }
}

impl Launch for ProcessLauncher {
    fn start(&self, target: &str) {
        let program = self.program_for(target);
        let spawned = Command::new(&program)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(child) => {
                tracing::info!(program = %program.display(), pid = child.id(), "started target");
                reap_in_background(child);
                std::thread::sleep(self.grace);
            }
            Err(e) => {
                tracing::warn!(program = %program.display(), "could not start target: {}", e);
            }
        }
    }
}

/// Waits for `child` on a detached thread so it is not left a zombie when it exits.
fn reap_in_background(mut child: Child) {
    let pid = child.id();
    let spawned = std::thread::Builder::new()
        .name(format!("reap-{pid}"))
        .spawn(move || match child.wait() {
            Ok(status) => tracing::info!(pid, %status, "target exited"),
            Err(e) => tracing::warn!(pid, "waiting for target failed: {}", e),
        });
    if let Err(e) = spawned {
        tracing::warn!(pid, "could not start reaper thread: {}", e);
    }
}
