//! Generic parsing and diffing primitives for IOS-style device configurations.
//!
//! Router and switch configurations are line-oriented but context-sensitive:
//! `ip address` means something different under `interface` than nowhere at
//! all, and the text rarely carries trustworthy indentation. [`parse`] turns
//! raw text into a [`ConfigNode`] tree using the keyword tables in
//! [`Dialect`], and [`diff`] compares two trees by command identity rather
//! than by line position.

pub mod dialect;
pub mod diff;
pub mod format;
pub mod parser;
pub mod tree;
pub mod writer;

pub use dialect::Dialect;
pub use diff::{diff, diff_with_options, DiffEntry, DiffOptions};
pub use format::{format_json, format_lines, format_summary, format_text};
pub use parser::{parse, parse_file, parse_with_dialect, ParseError};
pub use tree::ConfigNode;
pub use writer::{write, write_file};
