//! Repack pipeline: probe, order, describe, concatenate
//!
//! Progress is reported through a callback so the command layer decides how
//! (and whether) to draw it.

use crate::book::BookInfo;
use crate::chapters::{build_timeline, Timeline};
use crate::concat;
use crate::error::{RepackError, RepackResult};
use crate::metadata::{render_file_list, synthesize, MetadataDocument};
use crate::probe::{probe_chapters, MediaInspector, TitleSource};
use anyhow::{Context, Result};
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const LIST_FILE_NAME: &str = "list_audio_files.txt";
const METADATA_FILE_NAME: &str = "combined.metadata.txt";

/// Progress notifications emitted while a book is repacked
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Probing is about to start on this many files
    ProbeStarted { files: usize },
    /// One file has been probed
    ChapterProbed { title: String },
    /// The encoder has been asked to join the chapters
    ConcatStarted { total_seconds: f64 },
    /// Encoder progress, 100 only after a successful exit
    ConcatProgress { percent: u8 },
}

/// One folder's worth of chapter files and where the result goes
#[derive(Debug, Clone)]
pub struct RepackJob {
    pub folder: PathBuf,
    pub files: Vec<PathBuf>,
    /// Folder-style book string, also used as the output file name
    pub book_string: String,
    pub output_dir: PathBuf,
}

impl RepackJob {
    pub fn output_file(&self) -> PathBuf {
        self.output_dir.join(format!("{}.m4a", self.book_string))
    }

    pub fn list_file(&self) -> PathBuf {
        self.output_dir.join(LIST_FILE_NAME)
    }

    pub fn metadata_file(&self) -> PathBuf {
        self.output_dir.join(METADATA_FILE_NAME)
    }

    /// Chapter files in the order their chapters appear on `timeline`
    pub fn files_in_playback_order(&self, timeline: &Timeline) -> Vec<PathBuf> {
        timeline
            .chapters()
            .iter()
            .filter_map(|chapter| self.files.get(chapter.original_index).cloned())
            .collect()
    }

    fn first_file(&self) -> RepackResult<&Path> {
        self.files
            .first()
            .map(PathBuf::as_path)
            .ok_or_else(|| RepackError::NoInputFiles {
                folder: self.folder.clone(),
            })
    }
}

/// Probe every chapter file and lay the chapters out on one timeline
pub async fn probe_timeline<I, F>(
    inspector: &I,
    job: &RepackJob,
    batch_size: usize,
    titles: TitleSource,
    on_event: &mut F,
) -> RepackResult<Timeline>
where
    I: MediaInspector,
    F: FnMut(ProgressEvent),
{
    job.first_file()?;

    on_event(ProgressEvent::ProbeStarted {
        files: job.files.len(),
    });
    let records = probe_chapters(inspector, &job.files, batch_size, titles, |record| {
        on_event(ProgressEvent::ChapterProbed {
            title: record.title.clone(),
        })
    })
    .await?;

    let timeline = build_timeline(records);
    info!(
        "{} chapters, {:.1}s total",
        timeline.len(),
        timeline.total_seconds()
    );
    Ok(timeline)
}

/// Build the metadata document from the first chapter file's own tags
pub async fn describe<I: MediaInspector>(
    inspector: &I,
    job: &RepackJob,
    book: &BookInfo,
    timeline: &Timeline,
) -> RepackResult<MetadataDocument> {
    let raw = inspector.export_metadata(job.first_file()?).await?;
    let document = synthesize(&raw, book, timeline);
    debug!("global tags: {:?}", document.reconciliation());
    Ok(document)
}

/// Write the file list and metadata documents into the output folder.
///
/// The list follows `timeline` so audio and chapter markers line up.
pub fn write_documents(
    job: &RepackJob,
    timeline: &Timeline,
    metadata: &MetadataDocument,
) -> Result<()> {
    fs::create_dir_all(&job.output_dir)
        .with_context(|| format!("Failed to create {:?}", job.output_dir))?;

    let list_content = render_file_list(&job.files_in_playback_order(timeline));
    let list_file = job.list_file();
    fs::write(&list_file, &list_content)
        .with_context(|| format!("Failed to write file list {:?}", list_file))?;
    info!("List file content:\n{}", list_content);

    metadata.write_to(&job.metadata_file())
}

/// Remove the documents written by [`write_documents`]
pub fn remove_documents(job: &RepackJob) -> Result<()> {
    for path in [job.list_file(), job.metadata_file()] {
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove {:?}", path))?;
        }
    }
    Ok(())
}

/// Join the chapters into the output file, reporting encoder progress
pub async fn join<C, F>(
    job: &RepackJob,
    ffmpeg: &Path,
    timeline: &Timeline,
    cancel: C,
    on_event: &mut F,
) -> RepackResult<PathBuf>
where
    C: Future<Output = ()>,
    F: FnMut(ProgressEvent),
{
    let output = job.output_file();
    let total_seconds = timeline.total_seconds();

    on_event(ProgressEvent::ConcatStarted { total_seconds });
    concat::concatenate(
        ffmpeg,
        &job.list_file(),
        &job.metadata_file(),
        &output,
        total_seconds,
        cancel,
        |percent| on_event(ProgressEvent::ConcatProgress { percent }),
    )
    .await?;

    Ok(output)
}
