//! HTML generation from audited records.
//!
//! Each record is dispatched on its statute type to a [`FormatterKind`]
//! through a [`FormatterTable`]; the resulting rows are grouped by session
//! into the document published for the Congress.

mod document;
mod formatters;

pub use document::{GeneratedDocument, Generator};
pub use formatters::{FormatterKind, FormatterTable, escape, format_date};
