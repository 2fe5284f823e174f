//! Progress event formatting for the sender and receiver engines.
//!
//! The engines themselves know nothing about text output; they call a
//! `Fn(ProgressEvent)` callback, and this crate supplies the default
//! implementation of that callback (a line-oriented stream collaborators
//! can parse) plus the throttling policy that decides which updates are
//! worth emitting at all.

use std::io::Write;
use std::time::Duration;

use tracing::info;

/// Direction a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Send,
    Receive,
}

impl Direction {
    fn label(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Receive => "recv",
        }
    }
}

/// One progress sample for a single transfer entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub direction: Direction,
    pub name: String,
    pub transferred_bytes: u64,
    pub total_bytes: u64,
    pub bytes_per_second: f64,
}

impl ProgressEvent {
    fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            100.0
        } else {
            (self.transferred_bytes as f64 / self.total_bytes as f64) * 100.0
        }
    }

    fn eta_seconds(&self) -> u64 {
        if self.bytes_per_second <= 0.0 || self.transferred_bytes >= self.total_bytes {
            return 0;
        }
        let remaining = self.total_bytes - self.transferred_bytes;
        (remaining as f64 / self.bytes_per_second).ceil() as u64
    }
}

/// Formats a progress event as `[send|recv name] p% (sent/total) rate/s
/// ETA Ns`.
#[must_use]
pub fn format_progress_line(event: &ProgressEvent) -> String {
    format!(
        "[{} {}] {:.1}% ({}/{}) {}/s ETA {}s",
        event.direction.label(),
        event.name,
        event.percent(),
        event.transferred_bytes,
        event.total_bytes,
        event.bytes_per_second.round() as u64,
        event.eta_seconds(),
    )
}

/// Formats the terminal success line for a completed send batch.
#[must_use]
pub fn format_send_done(files: u64, bytes: u64, resumed: u64) -> String {
    format!("[send] done: files={files} bytes={bytes} resumed={resumed}")
}

/// Formats a fatal error line.
#[must_use]
pub fn format_error(message: &str) -> String {
    format!("[error] {message}")
}

/// Formats the receiver's per-file outcome line.
#[must_use]
pub fn format_receive_outcome(result: Result<&str, &str>) -> String {
    match result {
        Ok(path) => format!("[receive] saved {path}"),
        Err(message) => format!("[receive] failed: {message}"),
    }
}

/// Decides whether enough time or progress has passed since the last
/// emitted sample to justify emitting another one, per the ≥80ms /
/// ≥0.35% delta throttling rule.
#[must_use]
pub fn should_emit(
    last_emitted_at: Option<std::time::Instant>,
    last_percent: f64,
    current_percent: f64,
) -> bool {
    let time_elapsed = last_emitted_at
        .map(|t| t.elapsed() >= Duration::from_millis(80))
        .unwrap_or(true);
    let percent_delta = (current_percent - last_percent).abs() >= 0.35;
    time_elapsed || percent_delta
}

/// Writes formatted progress lines to a writer (stdout by default), one
/// per call. Kept as a trait so tests and alternate UIs can substitute a
/// capturing sink.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &ProgressEvent);
    fn emit_line(&self, line: &str);
}

/// The default sink: writes progress lines to the given writer and mirrors
/// them at debug level via `tracing`.
pub struct TextSink<W> {
    writer: std::sync::Mutex<W>,
}

impl<W: Write> TextSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: std::sync::Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> ProgressSink for TextSink<W> {
    fn emit(&self, event: &ProgressEvent) {
        self.emit_line(&format_progress_line(event));
    }

    fn emit_line(&self, line: &str) {
        info!("{line}");
        let mut writer = self.writer.lock().unwrap();
        let _ = writeln!(writer, "{line}");
    }
}
