//! In-memory inspector for tests

use super::MediaInspector;
use crate::error::{RepackError, RepackResult};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Answers from tables keyed by file name and records call overlap
#[derive(Default)]
pub struct FakeInspector {
    pub durations: HashMap<String, u64>,
    pub tags: HashMap<String, String>,
    pub metadata: String,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeInspector {
    pub fn with_durations(entries: &[(&str, u64)]) -> Self {
        Self {
            durations: entries
                .iter()
                .map(|(name, d)| (name.to_string(), *d))
                .collect(),
            metadata: ";FFMETADATA1\n".to_string(),
            ..Default::default()
        }
    }

    /// Most probes that were running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    fn failure(path: &Path) -> RepackError {
        RepackError::ProbeFailure {
            path: path.to_path_buf(),
            status: "exit status: 1".to_string(),
            stderr: "Invalid data found when processing input".to_string(),
        }
    }
}

impl MediaInspector for FakeInspector {
    async fn duration_micros(&self, path: &Path) -> RepackResult<u64> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.durations
            .get(&Self::name(path))
            .copied()
            .ok_or_else(|| Self::failure(path))
    }

    async fn embedded_title(&self, path: &Path) -> RepackResult<String> {
        Ok(self
            .tags
            .get(&Self::name(path))
            .cloned()
            .unwrap_or_else(|| "untagged".to_string()))
    }

    async fn export_metadata(&self, path: &Path) -> RepackResult<String> {
        if self.durations.contains_key(&Self::name(path)) {
            Ok(self.metadata.clone())
        } else {
            Err(Self::failure(path))
        }
    }
}
