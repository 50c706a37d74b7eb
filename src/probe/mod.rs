//! Duration and tag probing through the external media inspector

mod batch;
mod inspector;

pub use batch::{probe_chapters, TitleSource, DEFAULT_BATCH_SIZE};
pub use inspector::{Ffprobe, MediaInspector};

#[cfg(test)]
pub(crate) mod testing;
