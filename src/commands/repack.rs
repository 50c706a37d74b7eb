//! Repack command - join a book folder's chapter files into one m4a

use super::print_timeline;
use crate::book::BookInfo;
use crate::chapters::Timeline;
use crate::config::Config;
use crate::display::ProgressDisplay;
use crate::error::RepackError;
use crate::metadata::MetadataDocument;
use crate::pipeline::{self, ProgressEvent, RepackJob};
use crate::probe::{Ffprobe, TitleSource};
use crate::scan;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

/// Options for one repack run
#[derive(Debug, Clone)]
pub struct RepackArgs {
    pub folder: PathBuf,
    pub output: Option<PathBuf>,
    pub title: Option<String>,
    pub chapter_titles: Option<TitleSource>,
    pub batch_size: Option<usize>,
    pub keep_temp: bool,
    pub dry_run: bool,
}

enum Outcome {
    Planned(Timeline, MetadataDocument),
    Created(PathBuf),
}

pub fn run(args: &RepackArgs, quiet: bool) -> Result<()> {
    let config = Config::load()?;

    let files = scan::list_chapter_files(&args.folder)?;
    let folder = args
        .folder
        .canonicalize()
        .with_context(|| format!("Failed to open folder {:?}", args.folder))?;
    if files.is_empty() {
        return Err(RepackError::NoInputFiles { folder }.into());
    }

    let book_string = match &args.title {
        Some(title) => title.replace('"', ""),
        None => scan::book_string_for(&folder),
    };
    // Fail before any external process is started
    let book = BookInfo::parse(&book_string)?;
    debug!("parsed book info: {:?}", book);

    let job = RepackJob {
        output_dir: args
            .output
            .clone()
            .unwrap_or_else(|| scan::default_output_dir(&folder)),
        folder,
        files,
        book_string,
    };

    let rt = Runtime::new().context("Failed to create tokio runtime")?;
    let mut display = ProgressDisplay::new(quiet);
    let result = execute(&rt, args, &config, &job, &book, &mut display);
    display.finish();

    match result? {
        Outcome::Planned(timeline, document) => {
            println!("{} {}", "Would create".yellow(), job.output_file().display());
            println!();
            print_timeline(&timeline);
            println!();
            println!("{}", "Metadata document:".cyan());
            print!("{}", document.as_str());
        }
        Outcome::Created(path) => {
            println!("{} {}", "Created".green(), path.display());
        }
    }

    Ok(())
}

fn execute(
    rt: &Runtime,
    args: &RepackArgs,
    config: &Config,
    job: &RepackJob,
    book: &BookInfo,
    display: &mut ProgressDisplay,
) -> Result<Outcome> {
    let inspector = Ffprobe::new(
        &config.tools.ffprobe,
        &config.tools.ffmpeg,
        config.probe_timeout(),
    );
    let mut on_event = |event: ProgressEvent| display.handle(event);

    let (timeline, document) = rt.block_on(async {
        let timeline = pipeline::probe_timeline(
            &inspector,
            job,
            config.batch_size(args.batch_size),
            config.title_source(args.chapter_titles),
            &mut on_event,
        )
        .await?;
        let document = pipeline::describe(&inspector, job, book, &timeline).await?;
        Ok::<_, RepackError>((timeline, document))
    })?;

    if args.dry_run {
        return Ok(Outcome::Planned(timeline, document));
    }

    pipeline::write_documents(job, &timeline, &document)?;

    let output = rt.block_on(pipeline::join(
        job,
        &config.tools.ffmpeg,
        &timeline,
        interrupted(),
        &mut on_event,
    ))?;

    if args.keep_temp {
        debug!("keeping {:?} and {:?}", job.list_file(), job.metadata_file());
    } else if let Err(e) = pipeline::remove_documents(job) {
        warn!("{:#}", e);
    }

    Ok(Outcome::Created(output))
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
