//! Download progress reporting.
//!
//! The resolver calls a [`ProgressSink`] synchronously from inside the
//! blocking transfer; each invocation mode supplies its own sink. Throttling
//! happens before the sink is called (see [`ProgressThrottle`]), so sinks
//! emit every report they receive.

use crate::transport::write_frame;
use serde_json::{json, Map, Value};
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Receives `(bytes_so_far, bytes_total)` for the download in flight.
pub trait ProgressSink {
    fn report(&mut self, so_far: u64, total: u64);
}

impl<F: FnMut(u64, u64)> ProgressSink for F {
    fn report(&mut self, so_far: u64, total: u64) {
        self(so_far, total)
    }
}

/// Sink that drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _so_far: u64, _total: u64) {}
}

/// Minimum progress, in percent of the total, between two reports.
pub const REPORT_STEP_PERCENT: u64 = 5;

/// Per-fetch throttle: report at start, at completion and every 5% in between.
///
/// Reports never go backwards: a callback whose `so_far` is below the last
/// reported value is swallowed.
#[derive(Debug, Default)]
pub struct ProgressThrottle {
    last: Option<u64>,
}

impl ProgressThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true (and records `so_far`) when this update should reach the sink.
    pub fn should_report(&mut self, so_far: u64, total: u64) -> bool {
        let report = match self.last {
            None => true,
            Some(last) if so_far <= last => false,
            Some(_) if so_far >= total => true,
            Some(last) => (so_far - last).saturating_mul(100) >= REPORT_STEP_PERCENT.saturating_mul(total),
        };
        if report {
            self.last = Some(so_far);
        }
        report
    }
}

/// Last correlation token (`clientRef`) seen by the dispatcher.
///
/// Cloning shares the underlying slot: the dispatcher writes it at the start
/// of each request, progress sinks read it to tag their notifications.
#[derive(Debug, Default, Clone)]
pub struct Correlation {
    last: Arc<Mutex<Option<String>>>,
}

impl Correlation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, client_ref: Option<String>) {
        match self.last.lock() {
            Ok(mut guard) => *guard = client_ref,
            Err(poisoned) => *poisoned.into_inner() = client_ref,
        }
    }

    pub fn get(&self) -> Option<String> {
        match self.last.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

fn progress_object(so_far: u64, total: u64, client_ref: Option<String>) -> Map<String, Value> {
    let mut obj = Map::new();
    obj.insert("message".into(), json!("progress"));
    obj.insert("maximum".into(), json!(total));
    obj.insert("value".into(), json!(so_far));
    if let Some(r) = client_ref {
        obj.insert("clientRef".into(), json!(r));
    }
    obj
}

/// Emits each report as a length-prefixed progress frame (native-messaging session).
pub struct FrameProgress<W: Write> {
    out: W,
    correlation: Correlation,
}

impl<W: Write> FrameProgress<W> {
    pub fn new(out: W, correlation: Correlation) -> Self {
        Self { out, correlation }
    }
}

impl<W: Write> ProgressSink for FrameProgress<W> {
    fn report(&mut self, so_far: u64, total: u64) {
        let mut obj = progress_object(so_far, total, self.correlation.get());
        let label = if so_far < total {
            "Downloading..."
        } else {
            "Downloaded."
        };
        obj.insert("string".into(), json!(label));
        let frame = Value::Object(obj).to_string();
        if let Err(e) = write_frame(&mut self.out, frame.as_bytes()) {
            tracing::warn!("progress frame write failed: {}", e);
        }
    }
}

/// Prints one compact JSON object per report and line (one-shot JSON invocation).
pub struct JsonLineProgress<W: Write> {
    out: W,
    correlation: Correlation,
}

impl<W: Write> JsonLineProgress<W> {
    pub fn new(out: W, correlation: Correlation) -> Self {
        Self { out, correlation }
    }
}

impl<W: Write> ProgressSink for JsonLineProgress<W> {
    fn report(&mut self, so_far: u64, total: u64) {
        let line = Value::Object(progress_object(so_far, total, self.correlation.get()));
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            tracing::warn!("progress line write failed: {}", e);
        }
    }
}

/// Prints a `.` per report (plain command-relay invocation).
pub struct DotProgress<W: Write> {
    out: W,
}

impl<W: Write> DotProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ProgressSink for DotProgress<W> {
    fn report(&mut self, _so_far: u64, _total: u64) {
        if let Err(e) = self.out.write_all(b".").and_then(|_| self.out.flush()) {
            tracing::warn!("progress dot write failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::read_frame;

    fn fired(updates: impl IntoIterator<Item = u64>, total: u64) -> Vec<u64> {
        let mut throttle = ProgressThrottle::new();
        updates
            .into_iter()
            .filter(|&so_far| throttle.should_report(so_far, total))
            .collect()
    }

    #[test]
    fn throttle_fires_at_start_steps_and_end() {
        let got = fired((0..=1000).step_by(10), 1000);
        assert_eq!(got.first(), Some(&0));
        assert_eq!(got.last(), Some(&1000));
        for pair in got.windows(2) {
            assert!(pair[1] > pair[0], "reports must increase: {:?}", pair);
            let step = pair[1] - pair[0];
            assert!(step * 100 >= 5 * 1000 || pair[1] == 1000, "step too small: {:?}", pair);
        }
        assert_eq!(got.len(), 21);
    }

    #[test]
    fn throttle_swallows_repeats_and_regressions() {
        assert_eq!(fired([0, 0, 0, 600, 300, 600, 1000, 1000], 1000), vec![0, 600, 1000]);
    }

    #[test]
    fn throttle_first_report_can_be_mid_transfer() {
        assert_eq!(fired([400, 420, 460, 1000], 1000), vec![400, 460, 1000]);
    }

    #[test]
    fn correlation_is_shared_between_clones() {
        let a = Correlation::new();
        let b = a.clone();
        a.set(Some("ref-1".into()));
        assert_eq!(b.get().as_deref(), Some("ref-1"));
        b.set(None);
        assert_eq!(a.get(), None);
    }

    #[test]
    fn frame_progress_writes_labelled_frames() {
        let correlation = Correlation::new();
        correlation.set(Some("abc".into()));
        let mut buf = Vec::new();
        {
            let mut sink = FrameProgress::new(&mut buf, correlation.clone());
            sink.report(0, 10);
            sink.report(10, 10);
        }
        let mut reader = &buf[..];
        let first: Value = serde_json::from_slice(&read_frame(&mut reader).unwrap().unwrap()).unwrap();
        let second: Value = serde_json::from_slice(&read_frame(&mut reader).unwrap().unwrap()).unwrap();
        assert_eq!(first["message"], "progress");
        assert_eq!(first["string"], "Downloading...");
        assert_eq!(first["value"], 0);
        assert_eq!(first["maximum"], 10);
        assert_eq!(first["clientRef"], "abc");
        assert_eq!(second["string"], "Downloaded.");
        assert!(read_frame(&mut reader).unwrap().is_none());
    }

    #[test]
    fn json_line_progress_omits_absent_client_ref() {
        let mut buf = Vec::new();
        JsonLineProgress::new(&mut buf, Correlation::new()).report(5, 50);
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with('\n'));
        let v: Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(v["value"], 5);
        assert_eq!(v["maximum"], 50);
        assert!(v.get("clientRef").is_none());
    }

    #[test]
    fn dot_progress_prints_dots() {
        let mut buf = Vec::new();
        {
            let mut sink = DotProgress::new(&mut buf);
            sink.report(0, 2);
            sink.report(2, 2);
        }
        assert_eq!(buf, b"..");
    }

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sinks_survive_closed_output() {
        DotProgress::new(Closed).report(1, 2);
        JsonLineProgress::new(Closed, Correlation::new()).report(1, 2);
        FrameProgress::new(Closed, Correlation::new()).report(1, 2);
    }
}
