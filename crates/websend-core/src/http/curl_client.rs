//! libcurl-backed [`HttpClient`].

use super::{FetchResponse, Header, HttpClient, MultipartForm, TransportError, UploadResponse};
use crate::config::WebsendConfig;
use curl::easy::{Easy, Form, List};
use std::io::Write;
use std::str;
use std::time::Duration;

/// Blocking HTTP client built on the curl crate.
#[derive(Debug, Clone)]
pub struct CurlClient {
    connect_timeout: Duration,
    max_redirects: u32,
}

impl Default for CurlClient {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            max_redirects: 10,
        }
    }
}

impl CurlClient {
    pub fn new(connect_timeout: Duration, max_redirects: u32) -> Self {
        Self {
            connect_timeout,
            max_redirects,
        }
    }

    pub fn from_config(cfg: &WebsendConfig) -> Self {
        Self::new(cfg.connect_timeout(), cfg.max_redirects)
    }

    fn easy(&self, url: &str, headers: &[Header]) -> Result<Easy, TransportError> {
        let mut easy = Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(self.max_redirects)?;
        easy.connect_timeout(self.connect_timeout)?;

        if !headers.is_empty() {
            let mut list = List::new();
            for (k, v) in headers {
                list.append(&format!("{}: {}", k.trim(), v.trim()))?;
            }
            easy.http_headers(list)?;
        }
        Ok(easy)
    }
}

impl HttpClient for CurlClient {
    fn fetch(
        &self,
        url: &str,
        headers: &[Header],
        body: &mut dyn Write,
        progress: &mut dyn FnMut(u64, u64),
    ) -> Result<FetchResponse, TransportError> {
        let mut easy = self.easy(url, headers)?;
        easy.progress(true)?;

        let mut header_lines: Vec<String> = Vec::new();
        let mut written: u64 = 0;
        let mut write_error: Option<std::io::Error> = None;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| match body.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_error = Some(e);
                    // A short count makes libcurl abort the transfer.
                    Ok(0)
                }
            })?;
            transfer.progress_function(|dltotal, dlnow, _ultotal, _ulnow| {
                if dltotal > 0.0 {
                    progress(dlnow as u64, dltotal as u64);
                }
                true
            })?;
            transfer.perform()
        };

        if let Some(e) = write_error {
            return Err(TransportError::Io(e));
        }
        performed?;
        body.flush()?;

        let status = easy.response_code()?;
        tracing::debug!(url, status, bytes = written, "fetch finished");

        Ok(FetchResponse {
            status,
            bytes: written,
            content_disposition: super::content_disposition(&header_lines),
        })
    }

    fn upload(
        &self,
        url: &str,
        form: &MultipartForm,
        headers: &[Header],
    ) -> Result<UploadResponse, TransportError> {
        let mut easy = self.easy(url, headers)?;

        let mut post = Form::new();
        for (name, value) in &form.fields {
            post.part(name).contents(value.as_bytes()).add()?;
        }
        post.part(&form.file.name)
            .file(&form.file.path)
            .filename(&form.file.filename)
            .content_type(&form.file.content_type)
            .add()?;
        easy.httppost(post)?;

        let mut response_body: Vec<u8> = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                response_body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        tracing::debug!(url, status, bytes = response_body.len(), "upload finished");

        Ok(UploadResponse {
            status,
            body: response_body,
        })
    }
}
