mod info;

pub use info::BookInfo;
