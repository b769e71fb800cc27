//! Remote-reference resolution: rewrite `http(s)://` tokens in script lines
//! to local file paths, downloading each URL at most once per session.

mod cache;
mod download;
mod tokenize;

pub use cache::DownloadCache;
pub use download::status_explanation;
pub use tokenize::{is_remote_reference, tokenize};

use crate::http::{HttpClient, TransportError};
use crate::progress::ProgressSink;
use std::path::PathBuf;
use thiserror::Error;

/// How unseen URLs are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Fetch URLs not yet in the cache.
    Download,
    /// Only substitute URLs already in the cache; leave the rest untouched.
    RewriteOnly,
}

/// Why a remote reference could not be made local.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("{source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("Response code: {status}{}", status_explanation(*.status))]
    Status { url: String, status: u32 },
    #[error("Could not save {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rewrites every remote reference in `line` to its local path.
///
/// With [`Resolution::Download`], cache misses are fetched (sending
/// `authorization` verbatim when present) and recorded; the first failure
/// aborts the whole line. With [`Resolution::RewriteOnly`] this never fails
/// and never touches the network. Tokens are rejoined with single spaces.
pub fn resolve_line<C: HttpClient + ?Sized>(
    cache: &mut DownloadCache,
    client: &C,
    line: &str,
    authorization: Option<&str>,
    sink: &mut dyn ProgressSink,
    mode: Resolution,
) -> Result<String, DownloadError> {
    let mut resolved: Vec<String> = Vec::new();
    for token in tokenize(line) {
        if !is_remote_reference(token) {
            resolved.push(token.to_string());
            continue;
        }
        if let Some(path) = cache.get(token) {
            resolved.push(path.display().to_string());
            continue;
        }
        match mode {
            Resolution::RewriteOnly => resolved.push(token.to_string()),
            Resolution::Download => {
                let path =
                    download::download_to_dir(client, cache.download_dir(), token, authorization, sink)?;
                resolved.push(path.display().to_string());
                cache.insert(token, path);
            }
        }
    }
    Ok(resolved.join(" "))
}
