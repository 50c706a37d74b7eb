//! Progress estimation from the encoder's diagnostic output

use once_cell::sync::Lazy;
use regex::Regex;

/// Highest percentage reported before the encoder has exited successfully
const MAX_RUNNING_PERCENT: u8 = 99;

static ELAPSED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"time=(\d+):(\d+):(\d+(?:\.\d+)?)").expect("elapsed time pattern is valid")
});

/// Elapsed seconds from a status line such as `size=... time=00:01:02.50 bitrate=...`
pub fn elapsed_seconds(line: &str) -> Option<f64> {
    let captures = ELAPSED_RE.captures(line)?;
    let hours: f64 = captures.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = captures.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = captures.get(3)?.as_str().parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Map elapsed seconds onto 0..=99
pub fn percent_for(elapsed: f64, total_seconds: f64) -> u8 {
    if total_seconds <= 0.0 || !total_seconds.is_finite() {
        return 0;
    }
    let percent = (elapsed / total_seconds * 100.0).floor();
    percent.clamp(0.0, f64::from(MAX_RUNNING_PERCENT)) as u8
}

/// Progress of one encoder run
#[derive(Debug, Clone)]
pub struct ProgressState {
    total_seconds: f64,
    last_percent: u8,
}

impl ProgressState {
    pub fn new(total_seconds: f64) -> Self {
        Self {
            total_seconds,
            last_percent: 0,
        }
    }

    /// Percentage after seeing `line`, if it carried an elapsed-time marker.
    ///
    /// Never lower than a previously reported value.
    pub fn observe(&mut self, line: &str) -> Option<u8> {
        let elapsed = elapsed_seconds(line)?;
        let percent = percent_for(elapsed, self.total_seconds);
        self.last_percent = self.last_percent.max(percent);
        Some(self.last_percent)
    }

    /// Mark the run as successfully finished
    pub fn finish(&mut self) -> u8 {
        self.last_percent = 100;
        self.last_percent
    }

    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }
}

/// Splits a byte stream into lines on `\n` or `\r`.
///
/// The encoder redraws its status line with carriage returns, so waiting
/// for newlines alone would hold progress back until the run ends.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Feed a chunk and take every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                if !self.pending.is_empty() {
                    lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                    self.pending.clear();
                }
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Take the unterminated tail once the stream has ended
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }
}
