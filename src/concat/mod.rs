//! Concatenation through the external encoder with live progress

mod driver;
mod progress;

pub use driver::concatenate;
