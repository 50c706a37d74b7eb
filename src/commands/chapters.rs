//! Chapters command - probe a folder and show the joined timeline

use super::print_timeline;
use crate::chapters::{ChapterRecord, Timeline};
use crate::config::Config;
use crate::display::ProgressDisplay;
use crate::error::RepackError;
use crate::pipeline::{probe_timeline, ProgressEvent, RepackJob};
use crate::probe::{Ffprobe, TitleSource};
use crate::scan;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ChaptersReport<'a> {
    total_seconds: f64,
    chapters: &'a [ChapterRecord],
}

pub fn run(
    folder: &Path,
    json: bool,
    chapter_titles: Option<TitleSource>,
    quiet: bool,
) -> Result<()> {
    let config = Config::load()?;
    let files = scan::list_chapter_files(folder)?;
    let folder = folder
        .canonicalize()
        .with_context(|| format!("Failed to open folder {:?}", folder))?;
    if files.is_empty() {
        return Err(RepackError::NoInputFiles { folder }.into());
    }

    let job = RepackJob {
        book_string: scan::book_string_for(&folder),
        output_dir: scan::default_output_dir(&folder),
        folder,
        files,
    };
    let inspector = Ffprobe::new(
        &config.tools.ffprobe,
        &config.tools.ffmpeg,
        config.probe_timeout(),
    );

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    // JSON goes to stdout for other tools; keep the bars out of it
    let mut display = ProgressDisplay::new(quiet || json);
    let result = rt.block_on(probe_timeline(
        &inspector,
        &job,
        config.batch_size(None),
        config.title_source(chapter_titles),
        &mut |event: ProgressEvent| display.handle(event),
    ));
    display.finish();
    let timeline: Timeline = result?;

    if json {
        let report = ChaptersReport {
            total_seconds: timeline.total_seconds(),
            chapters: timeline.chapters(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_timeline(&timeline);
    }

    Ok(())
}
