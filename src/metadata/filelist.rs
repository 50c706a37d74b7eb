//! Concat demuxer file list

use std::path::PathBuf;

/// One `file '<path>'` line per input, in playback order.
///
/// Single quotes inside a path are closed, escaped and reopened (`'\''`).
pub fn render_file_list(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|path| {
            let path_str = path.to_string_lossy().replace('\'', "'\\''");
            format!("file '{}'", path_str)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
