mod document;
mod filelist;

pub use document::{synthesize, MetadataDocument};
pub use filelist::render_file_list;
