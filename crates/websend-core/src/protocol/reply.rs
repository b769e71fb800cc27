use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Integer status carried by every reply. Zero is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplyCode(pub u16);

impl ReplyCode {
    pub const SUCCESS: ReplyCode = ReplyCode(0);
    /// The target application did not take the command, even after a restart.
    pub const DELIVERY_FAILED: ReplyCode = ReplyCode(1);
    /// The `send` field was not an array of strings.
    pub const NOT_AN_ARRAY: ReplyCode = ReplyCode(501);
    /// A remote reference could not be downloaded.
    pub const DOWNLOAD_FAILED: ReplyCode = ReplyCode(600);
    pub const UNKNOWN_MESSAGE: ReplyCode = ReplyCode(700);
    /// Same class as [`ReplyCode::UNKNOWN_MESSAGE`] on the wire.
    pub const UPLOAD_FAILED: ReplyCode = ReplyCode(700);
    pub const NO_MESSAGE: ReplyCode = ReplyCode(800);
    pub const MISSING_UPLOAD_URL: ReplyCode = ReplyCode(801);
    pub const MISSING_FILE_URL: ReplyCode = ReplyCode(802);
    pub const MISSING_FILE_PARAMETER: ReplyCode = ReplyCode(803);
    /// The request body was not JSON.
    pub const UNPARSEABLE: ReplyCode = ReplyCode(900);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Locally built reply.
///
/// `error` is present exactly when `code` is non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub message: String,
    pub code: ReplyCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "clientRef", default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Reply {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: ReplyCode::SUCCESS,
            error: None,
            client_ref: None,
            version: None,
        }
    }

    pub fn failure(message: impl Into<String>, code: ReplyCode, error: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            error: Some(error.into()),
            client_ref: None,
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// What a request produced: our own status reply, or the upload target's
/// response passed through with `message`/`code` merged in.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Status(Reply),
    PassThrough(Map<String, Value>),
}

impl Outcome {
    /// Wraps an upload service's response, merging in `message="upload"` and `code=0`.
    pub fn pass_through(mut response: Map<String, Value>) -> Self {
        response.insert("message".into(), Value::from(super::UPLOAD));
        response.insert("code".into(), Value::from(ReplyCode::SUCCESS.0));
        Outcome::PassThrough(response)
    }

    /// Echoes the request's correlation token, if it had one.
    pub fn with_client_ref(self, client_ref: Option<&str>) -> Self {
        let Some(client_ref) = client_ref else {
            return self;
        };
        match self {
            Outcome::Status(mut reply) => {
                reply.client_ref = Some(client_ref.to_string());
                Outcome::Status(reply)
            }
            Outcome::PassThrough(mut map) => {
                map.insert("clientRef".into(), Value::from(client_ref));
                Outcome::PassThrough(map)
            }
        }
    }

    pub fn code(&self) -> ReplyCode {
        match self {
            Outcome::Status(reply) => reply.code,
            Outcome::PassThrough(_) => ReplyCode::SUCCESS,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Outcome::Status(reply) => serde_json::to_value(reply).unwrap_or_else(|e| {
                tracing::error!("reply serialization failed: {}", e);
                Value::Object(Map::new())
            }),
            Outcome::PassThrough(map) => Value::Object(map.clone()),
        }
    }

    /// Compact JSON encoding of the reply.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_value().to_string().into_bytes()
    }
}

impl From<Reply> for Outcome {
    fn from(reply: Reply) -> Self {
        Outcome::Status(reply)
    }
}
