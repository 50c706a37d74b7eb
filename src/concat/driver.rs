use super::progress::{LineBuffer, ProgressState};
use crate::error::{RepackError, RepackResult};
use std::collections::VecDeque;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Diagnostic lines kept for the failure report
const TAIL_LINES: usize = 8;

/// Build the encoder invocation that joins the listed files without re-encoding
pub fn encoder_command(
    ffmpeg: &Path,
    list_file: &Path,
    metadata_file: &Path,
    output: &Path,
) -> Command {
    let mut command = Command::new(ffmpeg);
    command
        .args(["-hide_banner", "-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(list_file)
        .arg("-i")
        .arg(metadata_file)
        .args(["-map_metadata", "1", "-c", "copy", "-movflags", "+faststart"])
        .arg(output);
    command
}

/// Join the files in `list_file` into `output`, embedding `metadata_file`.
///
/// `on_progress` receives percentages in 0..=99 while the encoder runs and
/// exactly one 100 once it exits successfully. Resolving `cancel` kills the
/// encoder.
pub async fn concatenate<C, F>(
    ffmpeg: &Path,
    list_file: &Path,
    metadata_file: &Path,
    output: &Path,
    total_seconds: f64,
    cancel: C,
    on_progress: F,
) -> RepackResult<()>
where
    C: Future<Output = ()>,
    F: FnMut(u8),
{
    let command = encoder_command(ffmpeg, list_file, metadata_file, output);
    run_encoder(command, total_seconds, cancel, on_progress).await
}

/// Run a prepared encoder command, following its diagnostic stream
pub async fn run_encoder<C, F>(
    mut command: Command,
    total_seconds: f64,
    cancel: C,
    mut on_progress: F,
) -> RepackResult<()>
where
    C: Future<Output = ()>,
    F: FnMut(u8),
{
    let tool = command.as_std().get_program().to_string_lossy().to_string();

    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| RepackError::Spawn {
        tool: tool.clone(),
        source,
    })?;
    debug!("{} started (pid {:?})", tool, child.id());

    tokio::pin!(cancel);

    let mut state = ProgressState::new(total_seconds);
    let mut lines = LineBuffer::default();
    let mut tail: VecDeque<String> = VecDeque::with_capacity(TAIL_LINES);
    let mut handle_line = |line: String, state: &mut ProgressState| {
        if let Some(percent) = state.observe(&line) {
            on_progress(percent);
        }
        if tail.len() == TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    };

    if let Some(mut stderr) = child.stderr.take() {
        let mut buf = [0u8; 4096];
        loop {
            tokio::select! {
                read = stderr.read(&mut buf) => match read {
                    Ok(0) => break,
                    Ok(n) => {
                        for line in lines.push(&buf[..n]) {
                            handle_line(line, &mut state);
                        }
                    }
                    Err(e) => {
                        warn!("Stopped reading {} output: {}", tool, e);
                        break;
                    }
                },
                _ = &mut cancel => {
                    stop(&mut child, &tool).await;
                    return Err(RepackError::Cancelled);
                }
            }
        }
        if let Some(line) = lines.finish() {
            handle_line(line, &mut state);
        }
    }

    let status = tokio::select! {
        status = child.wait() => status.map_err(|source| RepackError::Wait {
            tool: tool.clone(),
            source,
        })?,
        _ = &mut cancel => {
            stop(&mut child, &tool).await;
            return Err(RepackError::Cancelled);
        }
    };

    if status.success() {
        on_progress(state.finish());
        return Ok(());
    }

    debug!("{} failed at {}%", tool, state.last_percent());
    for line in &tail {
        warn!("{}: {}", tool, line);
    }
    Err(RepackError::ExternalTool {
        tool,
        exit_code: status.code().unwrap_or(-1),
    })
}

async fn stop(child: &mut Child, tool: &str) {
    warn!("Stopping {}", tool);
    if let Err(e) = child.kill().await {
        warn!("Failed to stop {}: {}", tool, e);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::future::{pending, ready};

    fn script(body: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(body);
        command
    }

    #[tokio::test]
    async fn test_reports_progress_then_hundred() {
        let command = script(
            "printf 'frame=1 time=00:00:50.00 bitrate=1\\r' >&2; \
             printf 'frame=2 time=00:02:00.00 bitrate=1\\n' >&2; exit 0",
        );
        let mut seen = Vec::new();

        run_encoder(command, 100.0, pending(), |p| seen.push(p))
            .await
            .unwrap();

        assert_eq!(seen, vec![50, 99, 100]);
    }

    #[tokio::test]
    async fn test_out_of_order_markers_do_not_regress() {
        let command = script(
            "printf 'time=00:01:00.00\\n' >&2; printf 'time=00:00:30.00\\n' >&2; exit 0",
        );
        let mut seen = Vec::new();

        run_encoder(command, 100.0, pending(), |p| seen.push(p))
            .await
            .unwrap();

        assert_eq!(seen, vec![60, 60, 100]);
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_external_tool_error() {
        let command = script("printf 'time=00:00:10.00\\n' >&2; exit 3");
        let mut seen = Vec::new();

        let err = run_encoder(command, 100.0, pending(), |p| seen.push(p))
            .await
            .unwrap_err();

        match err {
            RepackError::ExternalTool { exit_code, .. } => assert_eq!(exit_code, 3),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(seen, vec![10]);
    }

    #[tokio::test]
    async fn test_missing_encoder_is_spawn_error() {
        let command = Command::new("/nonexistent/ffmpeg");
        let err = run_encoder(command, 100.0, pending(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, RepackError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_cancel_stops_encoder() {
        let command = script("exec sleep 30");
        let mut seen = Vec::new();

        let err = run_encoder(command, 100.0, ready(()), |p| seen.push(p))
            .await
            .unwrap_err();

        assert!(matches!(err, RepackError::Cancelled));
        assert!(seen.is_empty());
    }

    #[test]
    fn test_encoder_command_arguments() {
        let command = encoder_command(
            Path::new("ffmpeg"),
            Path::new("/out/list_audio_files.txt"),
            Path::new("/out/combined.metadata.txt"),
            Path::new("/out/Book.m4a"),
        );
        let args: Vec<&OsStr> = command.as_std().get_args().collect();
        assert_eq!(
            args,
            vec![
                "-hide_banner",
                "-y",
                "-f",
                "concat",
                "-safe",
                "0",
                "-i",
                "/out/list_audio_files.txt",
                "-i",
                "/out/combined.metadata.txt",
                "-map_metadata",
                "1",
                "-c",
                "copy",
                "-movflags",
                "+faststart",
                "/out/Book.m4a",
            ]
        );
    }
}
