//! Chapter ordering and start/end offset assignment

use serde::Serialize;
use std::cmp::Ordering;

/// Separator between consecutive chapters, in microseconds
pub const CHAPTER_GAP: u64 = 1;

/// One input audio file and its place on the combined timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterRecord {
    /// 4-digit chapter number or zero-padded listing position
    pub key: String,
    pub duration_micros: u64,
    pub title: String,
    /// Position in the file listing, used to break ordering ties
    pub original_index: usize,
    pub start_micros: u64,
    pub end_micros: u64,
}

impl ChapterRecord {
    /// Create a record whose offsets are assigned later by [`build_timeline`]
    pub fn new(
        key: impl Into<String>,
        duration_micros: u64,
        title: impl Into<String>,
        original_index: usize,
    ) -> Self {
        Self {
            key: key.into(),
            duration_micros,
            title: title.into(),
            original_index,
            start_micros: 0,
            end_micros: 0,
        }
    }
}

/// Ordering policy for chapters.
///
/// Keys that both read as integers compare numerically, with the listing
/// position as tie-break. Anything else compares by listing position alone.
pub fn chapter_order(a: &ChapterRecord, b: &ChapterRecord) -> Ordering {
    match (a.key.parse::<u64>(), b.key.parse::<u64>()) {
        (Ok(ka), Ok(kb)) => ka
            .cmp(&kb)
            .then_with(|| a.original_index.cmp(&b.original_index)),
        _ => a.original_index.cmp(&b.original_index),
    }
}

/// Chapters sorted by start offset
#[derive(Debug, Clone, Default, Serialize)]
pub struct Timeline {
    chapters: Vec<ChapterRecord>,
}

impl Timeline {
    pub fn chapters(&self) -> &[ChapterRecord] {
        &self.chapters
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Sum of chapter durations, excluding the gaps
    pub fn total_micros(&self) -> u64 {
        self.chapters.iter().map(|c| c.duration_micros).sum()
    }

    /// Total duration in seconds, as used for progress estimation
    pub fn total_seconds(&self) -> f64 {
        self.total_micros() as f64 / 1_000_000.0
    }
}

/// Sort chapters and assign contiguous offsets.
///
/// The first chapter starts at 0, every chapter ends `duration` after its
/// start, and the next one starts [`CHAPTER_GAP`] after that.
pub fn build_timeline(mut records: Vec<ChapterRecord>) -> Timeline {
    records.sort_by(chapter_order);

    let mut cursor = 0u64;
    for record in &mut records {
        record.start_micros = cursor;
        record.end_micros = cursor + record.duration_micros;
        cursor = record.end_micros + CHAPTER_GAP;
    }

    Timeline { chapters: records }
}
