pub mod chapters;
pub mod parse_title;
pub mod repack;

use crate::chapters::Timeline;
use colored::Colorize;

/// Format microseconds as HH:MM:SS.mmm
pub fn format_timestamp(micros: u64) -> String {
    let millis = micros / 1_000;
    let hours = millis / 3_600_000;
    let minutes = (millis % 3_600_000) / 60_000;
    let seconds = (millis % 60_000) / 1_000;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        hours,
        minutes,
        seconds,
        millis % 1_000
    )
}

/// Print one row per chapter with its offsets on the joined timeline
pub fn print_timeline(timeline: &Timeline) {
    if timeline.is_empty() {
        println!("No chapters.");
        return;
    }

    println!(
        "{:>4}  {:<12}  {:<12}  {:<6}  {}",
        "#".cyan(),
        "Start".cyan(),
        "End".cyan(),
        "Key".cyan(),
        "Title".cyan()
    );
    for (i, chapter) in timeline.chapters().iter().enumerate() {
        println!(
            "{:>4}  {:<12}  {:<12}  {:<6}  {}",
            i + 1,
            format_timestamp(chapter.start_micros),
            format_timestamp(chapter.end_micros),
            chapter.key,
            chapter.title
        );
    }
    println!();
    println!(
        "{} chapters, {}",
        timeline.len(),
        format_timestamp(timeline.total_micros())
    );
}
