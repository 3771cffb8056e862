//! SAL: metadata tooling for the Statutes at Large collection.
//!
//! Worksheets describing the statutes of one Congress are normalized onto a
//! canonical record, reviewed by a curator who confirms the PDF page each
//! statute starts on, and rendered into the HTML tables published with the
//! scanned volumes.
//!
//! # Phases
//!
//! 1. **Normalize**: raw headers and statute-type labels are mapped through
//!    the [`mapping`] tables; every field is validated before any review.
//! 2. **Audit**: an interactive, checkpointed review of PDF start pages
//!    ([`audit`]). Sessions can stop and resume at any record.
//! 3. **Generate**: audited records are dispatched to per-category
//!    formatters and assembled into one document ([`generate`]).
//!
//! # Example
//!
//! ```no_run
//! use sal::{Phase, Pipeline};
//!
//! let pipeline = Pipeline::load("user-config.yaml").unwrap();
//! if pipeline.phase() == Phase::Generate {
//!     let document = pipeline.generate_to_file(false).unwrap();
//!     println!("{} rows written", document.fragment_count);
//! }
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod generate;
pub mod input;
pub mod mapping;
pub mod normalize;
pub mod numeral;
pub mod record;

mod pipeline;

pub use audit::{AuditEngine, AuditStatus, AuditedDataset, OffsetPolicyKind, Response};
pub use config::CongressConfig;
pub use error::{Result, SalError};
pub use generate::{GeneratedDocument, Generator};
pub use input::{DataTable, SourceMetadata};
pub use mapping::{CanonicalField, MappingTables, StatuteType, Visibility};
pub use normalize::Normalizer;
pub use pipeline::{Phase, Pipeline, PreparedDataset};
pub use record::CanonicalRecord;
