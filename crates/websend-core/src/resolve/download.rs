//! Fetching one remote reference to a local file.

use super::DownloadError;
use crate::http::{authorization_header, HttpClient};
use crate::progress::{ProgressSink, ProgressThrottle};
use crate::url_model::local_filename;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Explanation appended to non-200 status errors for the codes callers commonly hit.
pub fn status_explanation(status: u32) -> &'static str {
    match status {
        401 => " (unauthorized)",
        403 => " (forbidden)",
        404 => " (not found)",
        408 => " (request timeout)",
        504 => " (gateway timeout)",
        _ => "",
    }
}

/// Downloads `url` into `dir` and returns the absolute path of the saved file.
///
/// The body is streamed into a temp file beside the final location, which is
/// renamed into place only on HTTP 200. Any failure leaves nothing behind.
pub(crate) fn download_to_dir<C: HttpClient + ?Sized>(
    client: &C,
    dir: &Path,
    url: &str,
    authorization: Option<&str>,
    sink: &mut dyn ProgressSink,
) -> Result<PathBuf, DownloadError> {
    fs::create_dir_all(dir).map_err(|source| DownloadError::Save {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut temp = tempfile::Builder::new()
        .prefix(".websend-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|source| DownloadError::Save {
            path: dir.to_path_buf(),
            source,
        })?;

    let headers: Vec<_> = authorization_header(authorization).into_iter().collect();
    let mut throttle = ProgressThrottle::new();
    let mut on_progress = |so_far: u64, total: u64| {
        if throttle.should_report(so_far, total) {
            sink.report(so_far, total);
        }
    };

    tracing::info!(url, "downloading");
    let response = client
        .fetch(url, &headers, temp.as_file_mut(), &mut on_progress)
        .map_err(|source| {
            tracing::warn!(url, "download failed: {}", source);
            DownloadError::Transport {
                url: url.to_string(),
                source,
            }
        })?;

    if response.status != 200 {
        tracing::warn!(url, status = response.status, "download rejected");
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }

    let name = local_filename(url, response.content_disposition.as_deref());
    let target = persist_unique(temp, dir, &name)?;

    let absolute = fs::canonicalize(&target).map_err(|source| DownloadError::Save {
        path: target.clone(),
        source,
    })?;
    tracing::info!(url, path = %absolute.display(), bytes = response.bytes, "downloaded");
    Ok(absolute)
}

/// Most numbered variants tried before giving up on a name.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// `name` with ` (n)` inserted before the extension: `utt.wav` -> `utt (2).wav`.
pub(crate) fn numbered_name(name: &str, n: u32) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({n}).{ext}"),
        _ => format!("{name} ({n})"),
    }
}

/// Renames `temp` to `dir/name`, or the first free numbered variant. Never replaces an existing file.
fn persist_unique(mut temp: NamedTempFile, dir: &Path, name: &str) -> Result<PathBuf, DownloadError> {
    let mut target = dir.join(name);
    for attempt in 2..=MAX_NAME_ATTEMPTS + 1 {
        match temp.persist_noclobber(&target) {
            Ok(_) => return Ok(target),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!(path = %target.display(), "name taken, trying another");
                temp = e.file;
                target = dir.join(numbered_name(name, attempt));
            }
            Err(e) => {
                return Err(DownloadError::Save {
                    path: target,
                    source: e.error,
                })
            }
        }
    }
    Err(DownloadError::Save {
        path: dir.join(name),
        source: io::Error::new(io::ErrorKind::AlreadyExists, "no free file name"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explanations_for_known_codes() {
        assert_eq!(status_explanation(401), " (unauthorized)");
        assert_eq!(status_explanation(403), " (forbidden)");
        assert_eq!(status_explanation(404), " (not found)");
        assert_eq!(status_explanation(408), " (request timeout)");
        assert_eq!(status_explanation(504), " (gateway timeout)");
        assert_eq!(status_explanation(500), "");
    }

    #[test]
    fn status_error_text() {
        let e = DownloadError::Status {
            url: "http://x/a".into(),
            status: 404,
        };
        assert_eq!(e.to_string(), "Response code: 404 (not found)");
        let e = DownloadError::Status {
            url: "http://x/a".into(),
            status: 302,
        };
        assert_eq!(e.to_string(), "Response code: 302");
    }

    #[test]
    fn numbered_names_keep_the_extension() {
        assert_eq!(numbered_name("utt.wav", 2), "utt (2).wav");
        assert_eq!(numbered_name("a.tar.gz", 3), "a.tar (3).gz");
        assert_eq!(numbered_name("README", 2), "README (2)");
        assert_eq!(numbered_name(".hidden", 2), ".hidden (2)");
    }

    #[test]
    fn existing_file_is_never_replaced() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("utt.wav"), b"mine").unwrap();
        fs::write(dir.path().join("utt (2).wav"), b"also mine").unwrap();

        let mut temp = NamedTempFile::new_in(dir.path()).unwrap();
        std::io::Write::write_all(&mut temp, b"downloaded").unwrap();
        let path = persist_unique(temp, dir.path(), "utt.wav").unwrap();

        assert_eq!(path, dir.path().join("utt (3).wav"));
        assert_eq!(fs::read(&path).unwrap(), b"downloaded");
        assert_eq!(fs::read(dir.path().join("utt.wav")).unwrap(), b"mine");
        assert_eq!(fs::read(dir.path().join("utt (2).wav")).unwrap(), b"also mine");
    }
}
