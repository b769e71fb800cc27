//! JSON request/reply model shared by every invocation mode.
//!
//! Requests are objects discriminated by their `message` field; replies
//! always carry `message` and an integer `code` (see [`ReplyCode`]).

mod reply;
mod request;

pub use reply::{Outcome, Reply, ReplyCode};
pub use request::{parse_envelope, Envelope, Request, Script, UploadRequest};

/// Wire name of the default operation, used when a request names none.
pub const SEND: &str = "send";
pub const VERSION: &str = "version";
pub const UPLOAD: &str = "upload";
