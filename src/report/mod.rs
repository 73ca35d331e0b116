//! Report module - text, CSV and JSON artifacts

mod writer;

pub use writer::*;
