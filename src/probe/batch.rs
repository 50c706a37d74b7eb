//! Concurrent probing of a whole chapter set in fixed-size batches

use super::MediaInspector;
use crate::chapters::{chapter_key, ChapterRecord};
use crate::error::RepackResult;
use clap::ValueEnum;
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Inspector processes allowed in flight at once
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Where chapter titles come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TitleSource {
    /// File name without the `.m4a` extension
    #[default]
    Filename,
    /// Embedded `title` tag of each chapter file
    Tag,
}

/// Probe every file and build one unpositioned [`ChapterRecord`] per file.
///
/// Files are probed `batch_size` at a time; a batch must finish before the
/// next one starts. `on_probed` runs once per finished file. The first
/// failure aborts the run. Records come back in listing order.
pub async fn probe_chapters<I, F>(
    inspector: &I,
    files: &[PathBuf],
    batch_size: usize,
    titles: TitleSource,
    mut on_probed: F,
) -> RepackResult<Vec<ChapterRecord>>
where
    I: MediaInspector,
    F: FnMut(&ChapterRecord),
{
    let batch_size = batch_size.max(1);
    let mut records = Vec::with_capacity(files.len());

    for (batch_index, batch) in files.chunks(batch_size).enumerate() {
        let first = batch_index * batch_size;
        debug!(
            "probing batch {} ({} files)",
            batch_index + 1,
            batch.len()
        );

        let mut pending: FuturesUnordered<_> = batch
            .iter()
            .enumerate()
            .map(|(offset, path)| probe_one(inspector, path, first + offset, titles))
            .collect();

        while let Some(result) = pending.next().await {
            let record = result?;
            on_probed(&record);
            records.push(record);
        }
    }

    records.sort_by_key(|r| r.original_index);
    Ok(records)
}

async fn probe_one<I: MediaInspector>(
    inspector: &I,
    path: &Path,
    index: usize,
    titles: TitleSource,
) -> RepackResult<ChapterRecord> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let duration = inspector.duration_micros(path).await?;
    let title = match titles {
        TitleSource::Filename => filename
            .strip_suffix(".m4a")
            .unwrap_or(&filename)
            .to_string(),
        TitleSource::Tag => inspector.embedded_title(path).await?,
    };
    let key = chapter_key(&filename, index + 1);

    debug!("{}: key {} duration {}us", filename, key, duration);
    Ok(ChapterRecord::new(key, duration, title, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepackError;
    use crate::probe::testing::FakeInspector;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("/books").join(n)).collect()
    }

    #[tokio::test]
    async fn test_probe_builds_records_in_listing_order() {
        let inspector = FakeInspector::with_durations(&[
            ("Book - 0002 - Two.m4a", 30_000_000),
            ("Book - 0001 - One.m4a", 60_000_000),
        ]);
        let files = paths(&["Book - 0002 - Two.m4a", "Book - 0001 - One.m4a"]);

        let records = probe_chapters(&inspector, &files, 5, TitleSource::Filename, |_| {})
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, "0002");
        assert_eq!(records[0].title, "Book - 0002 - Two");
        assert_eq!(records[0].original_index, 0);
        assert_eq!(records[1].key, "0001");
        assert_eq!(records[1].duration_micros, 60_000_000);
    }

    #[tokio::test]
    async fn test_probe_never_exceeds_batch_size() {
        let names: Vec<String> = (1..=12).map(|i| format!("{:04}.m4a", i)).collect();
        let entries: Vec<(&str, u64)> = names.iter().map(|n| (n.as_str(), 1)).collect();
        let inspector = FakeInspector::with_durations(&entries);
        let files = paths(&names.iter().map(String::as_str).collect::<Vec<_>>());

        let mut probed = 0;
        let records = probe_chapters(&inspector, &files, 5, TitleSource::Filename, |_| {
            probed += 1
        })
        .await
        .unwrap();

        assert_eq!(records.len(), 12);
        assert_eq!(probed, 12);
        assert!(inspector.max_in_flight() <= 5);
    }

    #[tokio::test]
    async fn test_probe_fallback_keys_use_position() {
        let inspector =
            FakeInspector::with_durations(&[("Intro.m4a", 1), ("Outro.m4a", 2), ("Middle.m4a", 3)]);
        let files = paths(&["Intro.m4a", "Middle.m4a", "Outro.m4a"]);

        let records = probe_chapters(&inspector, &files, 2, TitleSource::Filename, |_| {})
            .await
            .unwrap();
        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["0001", "0002", "0003"]);
    }

    #[tokio::test]
    async fn test_probe_uses_tags_when_asked() {
        let mut inspector = FakeInspector::with_durations(&[("0001.m4a", 1)]);
        inspector
            .tags
            .insert("0001.m4a".to_string(), "Opening Credits".to_string());

        let records = probe_chapters(&inspector, &paths(&["0001.m4a"]), 5, TitleSource::Tag, |_| {})
            .await
            .unwrap();
        assert_eq!(records[0].title, "Opening Credits");
    }

    #[tokio::test]
    async fn test_probe_failure_aborts_run() {
        let inspector = FakeInspector::with_durations(&[("0001.m4a", 1)]);
        let files = paths(&["0001.m4a", "0002.m4a"]);

        let err = probe_chapters(&inspector, &files, 5, TitleSource::Filename, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, RepackError::ProbeFailure { .. }));
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_treated_as_one() {
        let inspector = FakeInspector::with_durations(&[("0001.m4a", 1), ("0002.m4a", 1)]);
        let files = paths(&["0001.m4a", "0002.m4a"]);

        let records = probe_chapters(&inspector, &files, 0, TitleSource::Filename, |_| {})
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(inspector.max_in_flight(), 1);
    }
}
