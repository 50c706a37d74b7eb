//! ffmetadata document synthesis
//!
//! The document handed to the muxer starts from the first chapter file's
//! own tags, gets its global tags reconciled, and ends with one `[CHAPTER]`
//! block per timeline entry.

use crate::book::BookInfo;
use crate::chapters::{ChapterRecord, Timeline};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::warn;

/// Header every ffmetadata document starts with
const HEADER: &str = ";FFMETADATA1";

/// Chapter offsets are written in microseconds
pub const TIMEBASE: &str = "1/1000000";

/// Global tags replaced wholesale when falling back to book info
const GLOBAL_TAGS: &[&str] = &["title", "album", "author", "artist", "album_artist"];

/// Which path the global tags took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Both `title=` and `album=` existed; title now carries the album value
    AlbumAsTitle,
    /// At least one was missing; the five global tags come from the book info
    FromBookInfo,
}

/// Metadata text consumed by the muxer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDocument {
    text: String,
    reconciliation: Reconciliation,
}

impl MetadataDocument {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn reconciliation(&self) -> Reconciliation {
        self.reconciliation
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.text)
            .with_context(|| format!("Failed to write metadata file {:?}", path))
    }
}

/// Build the full document from the first file's raw metadata
pub fn synthesize(raw: &str, book: &BookInfo, timeline: &Timeline) -> MetadataDocument {
    let (mut lines, reconciliation) = reconcile_tags(raw, book);

    if lines.first().map(String::as_str) != Some(HEADER) {
        lines.insert(0, HEADER.to_string());
    }

    let mut text = lines.join("\n");
    text.push('\n');

    let blocks: Vec<String> = timeline.chapters().iter().map(chapter_block).collect();
    if !blocks.is_empty() {
        text.push_str(&blocks.join("\n\n"));
        text.push('\n');
    }

    MetadataDocument {
        text,
        reconciliation,
    }
}

/// Apply the title/album rule to the global section of a raw document.
///
/// Only the entries before the first `[SECTION]` header are kept; chapter or
/// stream sections of a single chapter file do not belong in the result.
/// Each returned entry is one tag, including any continuation lines.
pub fn reconcile_tags(raw: &str, book: &BookInfo) -> (Vec<String>, Reconciliation) {
    let mut lines = global_entries(raw);

    let title_index = lines.iter().rposition(|l| l.starts_with("title="));
    let album_index = lines.iter().rposition(|l| l.starts_with("album="));

    if let (Some(title), Some(album)) = (title_index, album_index) {
        let album_value = lines[album]["album=".len()..].to_string();
        lines[title] = format!("title={}", album_value);
        return (lines, Reconciliation::AlbumAsTitle);
    }

    warn!("First chapter lacks 'title=' or 'album=' tags, using book info from folder name");

    lines.retain(|line| {
        !GLOBAL_TAGS
            .iter()
            .any(|tag| line.strip_prefix(*tag).is_some_and(|rest| rest.starts_with('=')))
    });

    let author = book.author.as_deref().unwrap_or_default();
    lines.push(format!("title={}", escape_value(&book.title)));
    lines.push(format!("album={}", escape_value(&book.title)));
    lines.push(format!("author={}", escape_value(author)));
    lines.push(format!("artist={}", escape_value(&book.artist())));
    lines.push(format!("album_artist={}", escape_value(author)));

    (lines, Reconciliation::FromBookInfo)
}

/// Split the global section into tag entries.
///
/// A line ending in an unescaped backslash continues onto the next line, so
/// a continuation starting with `[` is part of the value, not a section.
fn global_entries(raw: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    let mut continued = false;

    for line in raw.lines() {
        if continued {
            if let Some(entry) = entries.last_mut() {
                entry.push('\n');
                entry.push_str(line);
            }
        } else if line.starts_with('[') {
            break;
        } else if !line.is_empty() {
            entries.push(line.to_string());
        }
        continued = ends_with_open_escape(line);
    }

    entries
}

/// True when `line` ends in an odd run of backslashes
fn ends_with_open_escape(line: &str) -> bool {
    line.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

fn chapter_block(chapter: &ChapterRecord) -> String {
    format!(
        "[CHAPTER]\nTIMEBASE={}\nSTART={}\nEND={}\ntitle={}",
        TIMEBASE,
        chapter.start_micros,
        chapter.end_micros,
        escape_value(&chapter.title)
    )
}

/// Escape `=`, `;`, `#`, `\` and newlines for an ffmetadata value.
///
/// A newline is written as a backslash followed by a real line break.
fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '=' | ';' | '#' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push_str("\\\n"),
            '\r' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}
