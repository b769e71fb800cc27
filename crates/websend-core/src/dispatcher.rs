//! Request dispatcher: one JSON body in, one reply out.

use crate::config::WebsendConfig;
use crate::http::HttpClient;
use crate::progress::{Correlation, ProgressSink};
use crate::protocol::{parse_envelope, Outcome, Reply, ReplyCode, Request, Script, UploadRequest, SEND, UPLOAD, VERSION};
use crate::resolve::Resolution;
use crate::sender::Deliver;
use crate::session::Session;
use crate::upload::{self, UploadJob};
use std::path::Path;
use std::time::Duration;

/// Version reported for `{"message":"version"}`.
pub const BRIDGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Routes parsed requests to resolution, delivery and upload.
///
/// Owns the [`Session`]; every request handled by one dispatcher shares its
/// download cache and correlation slot.
pub struct Dispatcher<C, S> {
    client: C,
    sender: S,
    session: Session,
    delivery_timeout: Duration,
}

impl<C: HttpClient, S: Deliver> Dispatcher<C, S> {
    pub fn new(client: C, sender: S, session: Session, delivery_timeout: Duration) -> Self {
        Self {
            client,
            sender,
            session,
            delivery_timeout,
        }
    }

    /// Dispatcher with a fresh session in the configured download directory.
    pub fn from_config(cfg: &WebsendConfig, client: C, sender: S) -> Self {
        Self::new(
            client,
            sender,
            Session::new(cfg.resolved_download_dir()),
            cfg.request_timeout(),
        )
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Shared handle to the last correlation token; progress sinks read it.
    pub fn correlation(&self) -> Correlation {
        self.session.correlation().clone()
    }

    /// Handles one request body and returns the encoded reply.
    pub fn handle(&mut self, bytes: &[u8], sink: &mut dyn ProgressSink) -> Vec<u8> {
        self.dispatch(bytes, sink).to_bytes()
    }

    /// Handles one request body.
    ///
    /// The correlation slot is updated from `clientRef` before anything else
    /// happens, and cleared when the body is not JSON.
    pub fn dispatch(&mut self, bytes: &[u8], sink: &mut dyn ProgressSink) -> Outcome {
        let envelope = match parse_envelope(bytes) {
            Ok(envelope) => envelope,
            Err(reply) => {
                self.session.correlation().set(None);
                tracing::warn!("unparseable request: {}", reply.error.as_deref().unwrap_or_default());
                return reply.into();
            }
        };
        self.session.correlation().set(envelope.client_ref.clone());

        let outcome = match envelope.request {
            Err(reply) => {
                tracing::debug!(code = reply.code.0, "request rejected");
                reply.into()
            }
            Ok(request) => {
                tracing::debug!(kind = request.kind(), "dispatching request");
                self.route(request, envelope.authorization.as_deref(), sink)
            }
        };
        if !outcome.code().is_success() {
            tracing::info!(code = outcome.code().0, "request failed");
        }
        outcome.with_client_ref(envelope.client_ref.as_deref())
    }

    fn route(&mut self, request: Request, authorization: Option<&str>, sink: &mut dyn ProgressSink) -> Outcome {
        match request {
            Request::Version => Reply::success(VERSION).with_version(BRIDGE_VERSION).into(),
            Request::Send(script) => self.send(&script, authorization, sink).into(),
            Request::Upload(req) => self.upload(req, authorization, sink),
            Request::Unknown(kind) => Reply::failure(kind, ReplyCode::UNKNOWN_MESSAGE, "Unknown message.").into(),
        }
    }

    fn send(&mut self, script: &Script, authorization: Option<&str>, sink: &mut dyn ProgressSink) -> Reply {
        let text = match self.resolve_script(script, authorization, sink, Resolution::Download) {
            Ok(text) => text,
            Err(error) => return Reply::failure(SEND, ReplyCode::DOWNLOAD_FAILED, error),
        };
        match self.sender.send(&script.target, self.delivery_timeout, &text) {
            Ok(()) => Reply::success(SEND),
            Err(e) => Reply::failure(SEND, ReplyCode::DELIVERY_FAILED, e.to_string()),
        }
    }

    fn upload(&mut self, req: UploadRequest, authorization: Option<&str>, sink: &mut dyn ProgressSink) -> Outcome {
        // Uploads never download: the caller primed the cache with an earlier send.
        let text = match self.resolve_script(&req.script, None, sink, Resolution::RewriteOnly) {
            Ok(text) => text,
            Err(error) => return Reply::failure(UPLOAD, ReplyCode::DOWNLOAD_FAILED, error).into(),
        };
        if let Err(e) = self.sender.send(&req.script.target, self.delivery_timeout, &text) {
            return Reply::failure(UPLOAD, ReplyCode::DELIVERY_FAILED, e.to_string()).into();
        }

        let local = self.session.rewrite(&req.file_url);
        let job = UploadJob {
            url: &req.upload_url,
            field_name: &req.file_parameter,
            file_path: Path::new(&local),
            other_fields: &req.other_parameters,
            authorization,
        };
        match upload::upload(&self.client, &job) {
            Ok(response) => Outcome::pass_through(response),
            Err(e) => {
                tracing::warn!(url = %req.upload_url, "upload failed: {}", e);
                Reply::failure(UPLOAD, ReplyCode::UPLOAD_FAILED, e.to_string()).into()
            }
        }
    }

    /// Resolves every line and joins them with newlines; the first download error wins.
    fn resolve_script(
        &mut self,
        script: &Script,
        authorization: Option<&str>,
        sink: &mut dyn ProgressSink,
        mode: Resolution,
    ) -> Result<String, String> {
        let mut lines = Vec::with_capacity(script.lines.len());
        for line in &script.lines {
            let resolved = self
                .session
                .resolve_line(&self.client, line, authorization, sink, mode)
                .map_err(|e| e.to_string())?;
            lines.push(resolved);
        }
        Ok(lines.join("\n"))
    }
}
