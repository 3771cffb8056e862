//! Interactive audit of PDF start pages.
//!
//! Every normalized record is shown to a curator together with the PDF page
//! the configured [`OffsetPolicy`] expects it to start on. The curator accepts
//! the value or overrides it. Progress is checkpointed after each record, so
//! a session can stop at any point and later resume exactly where it left
//! off.
//!
//! ```no_run
//! use sal::audit::{AuditEngine, AuditOutcome, FileCheckpointStore, ScriptedResponder};
//! # fn example(records: Vec<sal::CanonicalRecord>) -> sal::Result<()> {
//! let engine = AuditEngine::new(FileCheckpointStore::new("tmp"));
//! let mut responder = ScriptedResponder::accept_all(records.len());
//! match engine.run_audit("LoC_1", "sha256:...", records, &mut responder)? {
//!     AuditOutcome::Complete(dataset) => dataset.save("tmp/audited-LoC_1.json")?,
//!     AuditOutcome::Suspended { resume_index, total } => {
//!         println!("stopped at {}/{}", resume_index, total)
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod checkpoint;
mod dataset;
mod decision;
mod engine;
mod offset;
mod responder;

pub use checkpoint::{
    CHECKPOINT_VERSION, Checkpoint, CheckpointStore, FileCheckpointStore, MemoryCheckpointStore,
    SessionLease, release_lease,
};
pub use dataset::AuditedDataset;
pub use decision::{AuditDecision, DecisionStatus, MonotonicityWarning, Response};
pub use engine::{AuditEngine, AuditOutcome, AuditSession, AuditStatus};
pub use offset::{OffsetPolicy, OffsetPolicyKind, PageDeltaOffset, RecordedOffset, SpanOffset};
pub use responder::{PendingConfirmation, Responder, ScriptedResponder};
