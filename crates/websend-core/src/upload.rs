//! Multipart upload of a local file to a remote service.

use crate::http::{authorization_header, FilePart, HttpClient, MultipartForm, TransportError};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Content type declared for the uploaded file part.
pub const FILE_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File to upload not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("{0}")]
    Transport(#[from] TransportError),
    #[error("JSON error: {source} (HTTP {status})")]
    InvalidJson {
        status: u32,
        #[source]
        source: serde_json::Error,
    },
    #[error("Upload response is not a JSON object (HTTP {status}).")]
    NotAnObject { status: u32 },
}

/// One upload: a local file posted as `field_name`, plus extra text fields.
#[derive(Debug, Clone, Copy)]
pub struct UploadJob<'a> {
    pub url: &'a str,
    pub field_name: &'a str,
    pub file_path: &'a Path,
    /// Only string values are sent; other values are skipped.
    pub other_fields: &'a Map<String, Value>,
    pub authorization: Option<&'a str>,
}

/// Builds the multipart body for `job`.
pub fn build_form(job: &UploadJob<'_>) -> MultipartForm {
    let fields = job
        .other_fields
        .iter()
        .filter_map(|(name, value)| match value.as_str() {
            Some(s) => Some((name.clone(), s.to_string())),
            None => {
                tracing::debug!(field = %name, "skipping non-string upload field");
                None
            }
        })
        .collect();

    let filename = job
        .file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| job.file_path.display().to_string());

    MultipartForm {
        fields,
        file: FilePart {
            name: job.field_name.to_string(),
            path: job.file_path.to_path_buf(),
            filename,
            content_type: FILE_CONTENT_TYPE.to_string(),
        },
    }
}

/// Posts `job` and returns the service's JSON object response.
///
/// The HTTP status is logged but not judged: whatever JSON object the service
/// answers with is handed back so the caller sees its native response.
pub fn upload<C: HttpClient + ?Sized>(client: &C, job: &UploadJob<'_>) -> Result<Map<String, Value>, UploadError> {
    if !job.file_path.is_file() {
        return Err(UploadError::MissingFile(job.file_path.to_path_buf()));
    }

    let form = build_form(job);
    let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
    headers.extend(authorization_header(job.authorization));

    tracing::info!(url = job.url, file = %job.file_path.display(), "uploading");
    let response = client.upload(job.url, &form, &headers)?;
    if !(200..300).contains(&response.status) {
        tracing::warn!(url = job.url, status = response.status, "upload answered with non-2xx status");
    }

    let parsed: Value = serde_json::from_slice(&response.body).map_err(|source| UploadError::InvalidJson {
        status: response.status,
        source,
    })?;
    match parsed {
        Value::Object(map) => Ok(map),
        _ => Err(UploadError::NotAnObject {
            status: response.status,
        }),
    }
}
