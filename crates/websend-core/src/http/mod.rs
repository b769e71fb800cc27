//! HTTP seam: the two transfers the core needs, behind a trait.
//!
//! [`CurlClient`] is the libcurl implementation; tests substitute fakes.

mod curl_client;
mod headers;

pub use curl_client::CurlClient;
pub use headers::content_disposition;

use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Transport-level failure (no usable HTTP response).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{}", .0.description())]
    Curl(#[from] curl::Error),
    #[error("multipart form: {0}")]
    Form(#[from] curl::FormError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Extra request header, e.g. `("Authorization", "Bearer ...")`.
pub type Header = (String, String);

/// Outcome of a GET that streamed its body to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// Final HTTP status (after redirects).
    pub status: u32,
    /// Bytes handed to the body sink.
    pub bytes: u64,
    /// Raw `Content-Disposition` value of the final response, if any.
    pub content_disposition: Option<String>,
}

/// Outcome of a multipart POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

/// File part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub name: String,
    pub path: PathBuf,
    pub filename: String,
    pub content_type: String,
}

/// Multipart form body: plain text fields followed by one file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub file: FilePart,
}

/// Blocking HTTP operations used by the resolver and the uploader.
///
/// `progress` is called from inside `fetch` with `(bytes_so_far, bytes_total)`
/// whenever the transport has news; throttling is the caller's business.
pub trait HttpClient {
    fn fetch(
        &self,
        url: &str,
        headers: &[Header],
        body: &mut dyn Write,
        progress: &mut dyn FnMut(u64, u64),
    ) -> Result<FetchResponse, TransportError>;

    fn upload(
        &self,
        url: &str,
        form: &MultipartForm,
        headers: &[Header],
    ) -> Result<UploadResponse, TransportError>;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn fetch(
        &self,
        url: &str,
        headers: &[Header],
        body: &mut dyn Write,
        progress: &mut dyn FnMut(u64, u64),
    ) -> Result<FetchResponse, TransportError> {
        (**self).fetch(url, headers, body, progress)
    }

    fn upload(
        &self,
        url: &str,
        form: &MultipartForm,
        headers: &[Header],
    ) -> Result<UploadResponse, TransportError> {
        (**self).upload(url, form, headers)
    }
}

/// `Authorization` header for an optional credential, passed through verbatim.
pub fn authorization_header(authorization: Option<&str>) -> Option<Header> {
    authorization.map(|value| ("Authorization".to_string(), value.to_string()))
}
