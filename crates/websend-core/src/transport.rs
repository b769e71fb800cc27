//! Length-prefixed framing and the persistent native-messaging session.
//!
//! Each frame is a native-endian `u32` byte count followed by that many
//! bytes of UTF-8 JSON, in both directions. End of stream (or a short
//! length prefix) is the only way a session ends.

use crate::dispatcher::Dispatcher;
use crate::http::HttpClient;
use crate::progress::FrameProgress;
use crate::sender::Deliver;
use std::io::{self, Read, Write};

/// Size of the length prefix in bytes.
pub const PREFIX_LEN: usize = 4;

/// Reads one frame.
///
/// Returns `Ok(None)` when the prefix cannot be read in full. A body cut short
/// by end of stream is returned as whatever bytes did arrive.
pub fn read_frame<R: Read + ?Sized>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut prefix = [0u8; PREFIX_LEN];
    if read_full(reader, &mut prefix)? < PREFIX_LEN {
        return Ok(None);
    }
    let len = u32::from_ne_bytes(prefix) as u64;

    let mut body = Vec::new();
    (&mut *reader).take(len).read_to_end(&mut body)?;
    if (body.len() as u64) < len {
        tracing::warn!(expected = len, got = body.len(), "frame body truncated");
    }
    Ok(Some(body))
}

/// Writes `bytes` as one frame and flushes.
pub fn write_frame<W: Write + ?Sized>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame larger than 4 GiB"))?;
    writer.write_all(&len.to_ne_bytes())?;
    writer.write_all(bytes)?;
    writer.flush()
}

fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Why [`run_session`] returned. Downloads have been cleaned up in every case.
#[derive(Debug)]
pub enum SessionEnd {
    /// The length prefix could not be read in full.
    EndOfStream,
    /// Reading from the caller failed.
    ReadFailed(io::Error),
    /// A reply frame could not be written.
    WriteFailed(io::Error),
}

/// Serves framed requests until the stream ends, then deletes every file
/// downloaded during the session.
///
/// Progress frames for a request are written to `writer` before its reply.
/// Zero-length frames are ignored.
pub fn run_session<R, W, C, S>(reader: &mut R, writer: &mut W, dispatcher: &mut Dispatcher<C, S>) -> SessionEnd
where
    R: Read + ?Sized,
    W: Write + ?Sized,
    C: HttpClient,
    S: Deliver,
{
    tracing::info!("native messaging session started");
    let mut handled: u64 = 0;
    let end = loop {
        let frame = match read_frame(reader) {
            Ok(Some(frame)) => frame,
            Ok(None) => break SessionEnd::EndOfStream,
            Err(e) => break SessionEnd::ReadFailed(e),
        };
        if frame.is_empty() {
            tracing::debug!("skipping empty frame");
            continue;
        }

        let reply = {
            let mut sink = FrameProgress::new(&mut *writer, dispatcher.correlation());
            dispatcher.handle(&frame, &mut sink)
        };
        handled += 1;
        if let Err(e) = write_frame(writer, &reply) {
            break SessionEnd::WriteFailed(e);
        }
    };

    match &end {
        SessionEnd::EndOfStream => tracing::info!(handled, "input closed; ending session"),
        SessionEnd::ReadFailed(e) => tracing::error!(handled, "session read failed: {}", e),
        SessionEnd::WriteFailed(e) => tracing::error!(handled, "session write failed: {}", e),
    }
    dispatcher.session_mut().cleanup();
    end
}
