use super::{Reply, ReplyCode, SEND, UPLOAD, VERSION};
use serde_json::{Map, Value};

/// Target application plus the script lines to run in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub target: String,
    pub lines: Vec<String>,
}

/// Fields of an `upload` request.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub upload_url: String,
    pub file_url: String,
    pub file_parameter: String,
    /// Extra form fields; only string values are sent.
    pub other_parameters: Map<String, Value>,
    pub script: Script,
}

/// A validated request, keyed by its `message` field.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Version,
    Send(Script),
    Upload(UploadRequest),
    /// A `message` value this bridge does not implement.
    Unknown(String),
}

/// Everything read from one request body.
///
/// `request` is `Err` with a ready-made reply when validation failed; the
/// correlation fields are still available in that case.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub client_ref: Option<String>,
    pub authorization: Option<String>,
    pub request: Result<Request, Reply>,
}

/// Parses a request body. Fails only when the body is not JSON at all.
pub fn parse_envelope(bytes: &[u8]) -> Result<Envelope, Reply> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| {
        Reply::failure(SEND, ReplyCode::UNPARSEABLE, parse_error_text(bytes, &e))
    })?;

    Ok(Envelope {
        client_ref: string_field(&value, "clientRef").map(str::to_string),
        authorization: string_field(&value, "authorization").map(str::to_string),
        request: Request::from_value(&value),
    })
}

impl Request {
    /// Validates a parsed body, checking fields in wire order and stopping at the first problem.
    pub fn from_value(value: &Value) -> Result<Request, Reply> {
        let Some(kind) = string_field(value, "message") else {
            return Err(Reply::failure(SEND, ReplyCode::NO_MESSAGE, "No message specified."));
        };

        match kind {
            VERSION => Ok(Request::Version),
            SEND => Ok(Request::Send(script(value, kind)?)),
            UPLOAD => {
                let upload_url = required(value, "uploadUrl", ReplyCode::MISSING_UPLOAD_URL)?;
                let file_url = required(value, "fileUrl", ReplyCode::MISSING_FILE_URL)?;
                let file_parameter = required(value, "fileParameter", ReplyCode::MISSING_FILE_PARAMETER)?;
                let other_parameters = match value.get("otherParameters") {
                    Some(Value::Object(map)) => map.clone(),
                    _ => Map::new(),
                };
                Ok(Request::Upload(UploadRequest {
                    upload_url,
                    file_url,
                    file_parameter,
                    other_parameters,
                    script: script(value, kind)?,
                }))
            }
            other => Ok(Request::Unknown(other.to_string())),
        }
    }

    /// Wire name of this request's operation.
    pub fn kind(&self) -> &str {
        match self {
            Request::Version => VERSION,
            Request::Send(_) => SEND,
            Request::Upload(_) => UPLOAD,
            Request::Unknown(kind) => kind,
        }
    }
}

fn string_field<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    value.get(name).and_then(Value::as_str)
}

fn required(value: &Value, name: &str, code: ReplyCode) -> Result<String, Reply> {
    match string_field(value, name) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(Reply::failure(UPLOAD, code, format!("{name} not supplied."))),
    }
}

/// The `send` array: first string names the target, the remaining strings are
/// script lines. Non-string elements are skipped.
fn script(value: &Value, kind: &str) -> Result<Script, Reply> {
    let Some(items) = value.get(SEND).and_then(Value::as_array) else {
        return Err(Reply::failure(kind, ReplyCode::NOT_AN_ARRAY, "send is not an array."));
    };
    let mut strings = items.iter().filter_map(Value::as_str).map(str::to_string);
    let Some(target) = strings.next() else {
        return Err(Reply::failure(kind, ReplyCode::NOT_AN_ARRAY, "send has no program name."));
    };
    Ok(Script {
        target,
        lines: strings.collect(),
    })
}

/// `Error before: <input at the failure point>`, or the parser's own message
/// when the failure is at the end of input.
fn parse_error_text(bytes: &[u8], err: &serde_json::Error) -> String {
    let text = String::from_utf8_lossy(bytes);
    let line_start: usize = text
        .split_inclusive('\n')
        .take(err.line().saturating_sub(1))
        .map(str::len)
        .sum();
    let offset = line_start + err.column().saturating_sub(1);
    let rest: String = text.get(offset..).unwrap_or("").chars().take(40).collect();
    if rest.trim().is_empty() {
        format!("Could not parse JSON: {err}")
    } else {
        format!("Error before: {rest}")
    }
}
