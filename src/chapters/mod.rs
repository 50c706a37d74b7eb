mod key;
mod timeline;

pub use key::{chapter_key, title_from_filename};
pub use timeline::{build_timeline, ChapterRecord, Timeline};
