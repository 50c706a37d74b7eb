//! Book information parsed from a folder name
//!
//! Audiobook downloads are commonly stored in folders named like
//! `The Martian - Written by Andy Weir - Narrated by R. C. Bray`.

use crate::error::{RepackError, RepackResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Leading free text up to the "Written by" marker
const TITLE_PATTERN: &str = r"^(.*)- Writ";
/// Author text up to the dash before the narrator
const AUTHOR_PATTERN: &str = r"ten by (.*) -";
/// Narrator text to the end of the string
const NARRATOR_PATTERN: &str = r" Narrated by (.*)$";

static BOOK_INFO_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!("{TITLE_PATTERN}{AUTHOR_PATTERN}{NARRATOR_PATTERN}");
    Regex::new(&pattern).expect("book info pattern is valid")
});

/// Title, author and narrator of one book
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookInfo {
    pub title: String,
    pub author: Option<String>,
    pub narrator: Option<String>,
}

impl BookInfo {
    /// Parse "<title> - Written by <author> - Narrated by <narrator>"
    pub fn parse(title: &str) -> RepackResult<Self> {
        let captures =
            BOOK_INFO_RE
                .captures(title)
                .ok_or_else(|| RepackError::UnparseableTitle {
                    title: title.to_string(),
                })?;

        let group = |index: usize| {
            captures
                .get(index)
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        Ok(Self {
            title: captures
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
            author: group(2),
            narrator: group(3),
        })
    }

    /// Value for the `artist` tag, e.g. "Andy Weir; Narrated by R. C. Bray"
    pub fn artist(&self) -> String {
        match (self.author.as_deref(), self.narrator.as_deref()) {
            (Some(author), Some(narrator)) => format!("{}; Narrated by {}", author, narrator),
            (Some(author), None) => author.to_string(),
            (None, Some(narrator)) => format!("Narrated by {}", narrator),
            (None, None) => String::new(),
        }
    }
}
