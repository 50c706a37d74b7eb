mod book;
mod chapters;
mod cli;
mod commands;
mod concat;
mod config;
mod display;
mod error;
mod metadata;
mod pipeline;
mod probe;
mod scan;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Repack {
            folder,
            output,
            title,
            chapter_titles,
            batch_size,
            keep_temp,
            dry_run,
        } => {
            let args = commands::repack::RepackArgs {
                folder,
                output,
                title,
                chapter_titles,
                batch_size,
                keep_temp,
                dry_run,
            };
            commands::repack::run(&args, cli.quiet)?;
        }
        Commands::Chapters {
            folder,
            json,
            chapter_titles,
        } => {
            commands::chapters::run(&folder, json, chapter_titles, cli.quiet)?;
        }
        Commands::ParseTitle { title, json } => {
            commands::parse_title::run(&title, json)?;
        }
    }

    Ok(())
}

/// Log to stderr. RUST_LOG wins over the verbosity flags.
fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "audiobook_repack=debug"
    } else if quiet {
        "audiobook_repack=error"
    } else {
        "audiobook_repack=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}
