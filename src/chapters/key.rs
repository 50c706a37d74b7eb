//! Chapter keys and titles derived from file names

use once_cell::sync::Lazy;
use regex::Regex;

static CHAPTER_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{4})").expect("chapter number pattern is valid"));

/// Extract the 4-digit (ASCII) chapter number from a file name.
///
/// Falls back to the 1-based listing position, zero-padded to four digits,
/// when the name carries no such number.
pub fn chapter_key(filename: &str, position: usize) -> String {
    CHAPTER_NUMBER_RE
        .captures(filename)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| format!("{:04}", position))
}

/// Derive a chapter title from a file name.
///
/// Takes the text between the last "- " marker and the `.m4a` extension,
/// e.g. `Book - 0003 - The Storm.m4a` gives `The Storm`. Names without the
/// marker yield everything before the extension.
pub fn title_from_filename(filename: &str) -> String {
    let end = filename.find(".m4a").unwrap_or(filename.len());
    let stem = &filename[..end];

    match stem.rfind("- ") {
        Some(idx) => stem[idx + 2..].to_string(),
        None => stem.to_string(),
    }
}
