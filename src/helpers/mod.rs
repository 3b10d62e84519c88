//! Date helpers shared by the file format and the CLI output

mod date;

pub use date::*;
