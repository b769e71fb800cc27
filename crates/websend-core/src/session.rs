//! Per-process (or per-session) mutable state shared by the request path
//! and the progress path.

use crate::http::HttpClient;
use crate::progress::{Correlation, ProgressSink};
use crate::resolve::{self, DownloadCache, DownloadError, Resolution};
use std::path::PathBuf;

/// Download cache plus the last correlation token.
///
/// One `Session` lives as long as the framed transport loop, or as long as a
/// single command-line invocation. Only the framed loop tears it down.
#[derive(Debug)]
pub struct Session {
    cache: DownloadCache,
    correlation: Correlation,
}

impl Session {
    /// New session placing downloads in `download_dir`.
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache: DownloadCache::new(download_dir),
            correlation: Correlation::new(),
        }
    }

    pub fn cache(&self) -> &DownloadCache {
        &self.cache
    }

    /// Handle to the correlation slot; clones observe later updates.
    pub fn correlation(&self) -> &Correlation {
        &self.correlation
    }

    /// See [`resolve::resolve_line`].
    pub fn resolve_line<C: HttpClient + ?Sized>(
        &mut self,
        client: &C,
        line: &str,
        authorization: Option<&str>,
        sink: &mut dyn ProgressSink,
        mode: Resolution,
    ) -> Result<String, DownloadError> {
        resolve::resolve_line(&mut self.cache, client, line, authorization, sink, mode)
    }

    /// Local path for a URL downloaded earlier in this session, else the input unchanged.
    pub fn rewrite(&self, reference: &str) -> String {
        match self.cache.get(reference) {
            Some(path) => path.display().to_string(),
            None => reference.to_string(),
        }
    }

    /// Deletes every downloaded file and forgets the cache.
    pub fn cleanup(&mut self) -> usize {
        let removed = self.cache.cleanup();
        tracing::info!(removed, "session downloads cleaned up");
        removed
    }
}
