//! Worksheet input parsing.

mod parser;
mod source;

pub use parser::{Parser, ParserConfig, fingerprint};
pub use source::{DataTable, RawRecord, SourceMetadata};
