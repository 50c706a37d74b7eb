use crate::probe::TitleSource;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "audiobook-repack")]
#[command(about = "Join per-chapter m4a audiobook files into one file with chapter markers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress progress bars and non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Join the chapter files of a book folder into one m4a with chapters
    Repack {
        /// Folder named "<title> - Written by <author> - Narrated by <narrator>"
        folder: PathBuf,

        /// Output directory (default: "<folder>_repack" next to the folder)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Book string to use instead of the folder name
        #[arg(long)]
        title: Option<String>,

        /// Where chapter titles come from (uses config default if not specified)
        #[arg(long, value_enum)]
        chapter_titles: Option<TitleSource>,

        /// Number of files probed at once (uses config default if not specified)
        #[arg(long, value_parser = parse_batch_size)]
        batch_size: Option<usize>,

        /// Keep the generated file list and metadata documents
        #[arg(long)]
        keep_temp: bool,

        /// Probe and print the plan without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Probe a book folder and print its chapter timeline
    Chapters {
        /// Folder containing the chapter files
        folder: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Where chapter titles come from (uses config default if not specified)
        #[arg(long, value_enum)]
        chapter_titles: Option<TitleSource>,
    },

    /// Parse a "<title> - Written by <author> - Narrated by <narrator>" string
    ParseTitle {
        /// Book string, usually a folder name
        title: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Parse a probe batch size, which must be at least 1
pub fn parse_batch_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid batch size '{value}'"))?;
    if size == 0 {
        return Err("batch size must be at least 1".into());
    }
    Ok(size)
}
