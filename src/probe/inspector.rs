use crate::chapters::title_from_filename;
use crate::error::{RepackError, RepackResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Digits after the decimal point in the inspector's duration output
const FRACTION_DIGITS: usize = 6;

static TITLE_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^TAG:title=(.*)$").expect("title tag pattern is valid"));

/// Read-only questions the pipeline asks about a media file
pub trait MediaInspector {
    /// Stream duration in microseconds
    async fn duration_micros(&self, path: &Path) -> RepackResult<u64>;

    /// Embedded `title` tag, or a title derived from the file name
    async fn embedded_title(&self, path: &Path) -> RepackResult<String>;

    /// Global tags of the file as an ffmetadata document
    async fn export_metadata(&self, path: &Path) -> RepackResult<String>;
}

/// Inspector backed by the ffprobe and ffmpeg executables
#[derive(Debug, Clone)]
pub struct Ffprobe {
    ffprobe: PathBuf,
    ffmpeg: PathBuf,
    timeout: Duration,
}

impl Ffprobe {
    pub fn new(ffprobe: impl Into<PathBuf>, ffmpeg: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            ffmpeg: ffmpeg.into(),
            timeout,
        }
    }

    /// Run a prepared command for one file and return its stdout
    async fn capture(&self, mut command: Command, path: &Path) -> RepackResult<String> {
        let tool = command.as_std().get_program().to_string_lossy().to_string();
        debug!("{} {}", tool, path.display());

        command.stdin(Stdio::null()).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| RepackError::ProbeTimeout {
                path: path.to_path_buf(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|source| RepackError::Spawn { tool, source })?;

        if !output.status.success() {
            return Err(RepackError::ProbeFailure {
                path: path.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl MediaInspector for Ffprobe {
    async fn duration_micros(&self, path: &Path) -> RepackResult<u64> {
        let mut command = Command::new(&self.ffprobe);
        command
            .args(["-v", "error", "-select_streams", "a:0"])
            .args(["-show_entries", "format=duration", "-of", "csv=p=0"])
            .arg(path);
        let stdout = self.capture(command, path).await?;

        let value = stdout.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        parse_duration_micros(value).ok_or_else(|| RepackError::unparseable_output(path, &stdout))
    }

    async fn embedded_title(&self, path: &Path) -> RepackResult<String> {
        let mut command = Command::new(&self.ffprobe);
        command
            .args(["-show_entries", "format_tags=title", "-v", "quiet"])
            .arg(path);
        let stdout = self.capture(command, path).await?;

        if let Some(title) = find_title_tag(&stdout) {
            return Ok(title);
        }

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(title_from_filename(&filename))
    }

    async fn export_metadata(&self, path: &Path) -> RepackResult<String> {
        let mut command = Command::new(&self.ffmpeg);
        command
            .args(["-loglevel", "error", "-i"])
            .arg(path)
            .args(["-f", "ffmetadata", "-"]);
        self.capture(command, path).await
    }
}

/// First `TAG:title=` value in the inspector's line output
fn find_title_tag(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        TITLE_TAG_RE
            .captures(line.trim_end_matches('\r'))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Convert decimal seconds to microseconds at a fixed scale.
///
/// The inspector prints six fractional digits, so "60.000000" becomes
/// 60000000. Shorter fractions are padded, longer ones truncated.
pub fn parse_duration_micros(text: &str) -> Option<u64> {
    let text = text.trim();
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut digits: String = fraction.chars().take(FRACTION_DIGITS).collect();
    while digits.len() < FRACTION_DIGITS {
        digits.push('0');
    }
    let fraction: u64 = digits.parse().ok()?;

    whole.checked_mul(1_000_000)?.checked_add(fraction)
}
