//! Process-lifetime URL → local file map.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Remembers where each downloaded URL was saved.
///
/// Keys are exact URL strings. An entry, once recorded, is never replaced.
/// The map lives in memory only; [`DownloadCache::cleanup`] deletes the
/// files it points at.
#[derive(Debug)]
pub struct DownloadCache {
    dir: PathBuf,
    entries: HashMap<String, PathBuf>,
}

impl DownloadCache {
    /// Empty cache placing downloads in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: HashMap::new(),
        }
    }

    /// Directory downloads are written to.
    pub fn download_dir(&self) -> &Path {
        &self.dir
    }

    pub fn get(&self, url: &str) -> Option<&Path> {
        self.entries.get(url).map(PathBuf::as_path)
    }

    /// Records `url → path` unless `url` is already present. Returns whether it was recorded.
    pub fn insert(&mut self, url: &str, path: PathBuf) -> bool {
        if self.entries.contains_key(url) {
            return false;
        }
        self.entries.insert(url.to_string(), path);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deletes every downloaded file and forgets all entries. Returns how many files were removed.
    ///
    /// Files that are already gone or cannot be deleted are logged and skipped.
    pub fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for (url, path) in self.entries.drain() {
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(url = %url, path = %path.display(), "deleted download");
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "could not delete download: {}", e)
                }
            }
        }
        removed
    }
}
