//! Minimal HTTP/1.1 server for integration tests.
//!
//! Routes by path:
//! - `/status/<code>/...` answers `<code>` with an empty body.
//! - `/named/<filename>/...` serves the body with a `Content-Disposition` filename.
//! - `POST /upload` reads the multipart body and answers a JSON summary of it.
//! - anything else serves the body with 200.
//!
//! Every request is counted; see [`TestServer::hits`].

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub struct TestServer {
    base: String,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    /// URL for `path` on this server (`path` without leading slash).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread serving `body`. It runs until the process exits.
pub fn start(body: Vec<u8>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            counter.fetch_add(1, Ordering::SeqCst);
            thread::spawn(move || handle(stream, &body));
        }
    });
    TestServer {
        base: format!("http://127.0.0.1:{}/", port),
        hits,
    }
}

struct Head {
    method: String,
    path: String,
    content_length: usize,
    expect_continue: bool,
    authorization: Option<String>,
}

fn handle(mut stream: TcpStream, body: &[u8]) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    let mut raw = Vec::new();
    let mut buf = [0u8; 8192];
    let header_end = loop {
        if let Some(pos) = find(&raw, b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
        }
    };
    let Ok(head_text) = std::str::from_utf8(&raw[..header_end]) else {
        return;
    };
    let head = parse_head(head_text);

    if head.method.eq_ignore_ascii_case("POST") {
        if head.expect_continue {
            let _ = stream.write_all(b"HTTP/1.1 100 Continue\r\n\r\n");
        }
        let mut request_body = raw[header_end..].to_vec();
        while request_body.len() < head.content_length {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => request_body.extend_from_slice(&buf[..n]),
            }
        }
        let summary = serde_json::json!({
            "received": request_body.len(),
            "authorization": head.authorization,
            "text": String::from_utf8_lossy(&request_body),
        })
        .to_string();
        respond(&mut stream, "200 OK", &[("Content-Type", "application/json")], summary.as_bytes());
        return;
    }

    let mut segments = head.path.trim_start_matches('/').split('/');
    match (segments.next(), segments.next()) {
        (Some("status"), Some(code)) => {
            let status = format!("{} Test", code);
            respond(&mut stream, &status, &[], b"");
        }
        (Some("named"), Some(name)) => {
            let disposition = format!("attachment; filename=\"{}\"", name);
            respond(&mut stream, "200 OK", &[("Content-Disposition", &disposition)], body);
        }
        _ => respond(&mut stream, "200 OK", &[], body),
    }
}

fn respond(stream: &mut TcpStream, status: &str, headers: &[(&str, &str)], body: &[u8]) {
    let mut response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for (name, value) in headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str("\r\n");
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body);
}

fn parse_head(text: &str) -> Head {
    let mut lines = text.lines();
    let mut request_line = lines.next().unwrap_or("").split_whitespace();
    let mut head = Head {
        method: request_line.next().unwrap_or("").to_string(),
        path: request_line.next().unwrap_or("/").to_string(),
        content_length: 0,
        expect_continue: false,
        authorization: None,
    };
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "content-length" => head.content_length = value.parse().unwrap_or(0),
            "expect" => head.expect_continue = value.eq_ignore_ascii_case("100-continue"),
            "authorization" => head.authorization = Some(value.to_string()),
            _ => {}
        }
    }
    head
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
