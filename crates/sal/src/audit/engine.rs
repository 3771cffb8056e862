//! The audit state machine.
//!
//! A dataset moves from not started, through in progress, to complete. An
//! [`AuditSession`] owns the dataset while it runs: it takes the lease stored
//! in the checkpoint, persists after every decision, and gives the lease back
//! when it is suspended, finished, or dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, SalError};
use crate::record::CanonicalRecord;

use super::checkpoint::{Checkpoint, CheckpointStore, SessionLease};
use super::dataset::AuditedDataset;
use super::decision::{AuditDecision, DecisionStatus, MonotonicityWarning, Response};
use super::offset::{OffsetPolicy, OffsetPolicyKind};
use super::responder::{PendingConfirmation, Responder};

/// Where a dataset stands in the audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuditStatus {
    NotStarted,
    InProgress {
        resume_index: usize,
        total: usize,
        /// Present while a session holds the dataset, or after one crashed.
        lease: Option<SessionLease>,
    },
    /// All records confirmed; the checkpoint awaits archiving.
    Complete,
}

impl AuditStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AuditStatus::NotStarted => "Not started",
            AuditStatus::InProgress { .. } => "In progress",
            AuditStatus::Complete => "Complete",
        }
    }
}

/// How a call to [`AuditSession::run`] ended.
#[derive(Debug)]
pub enum AuditOutcome {
    /// The responder stopped early; progress is saved.
    Suspended { resume_index: usize, total: usize },
    /// Every record is audited.
    Complete(AuditedDataset),
}

/// Runs audits against a checkpoint store.
pub struct AuditEngine<S: CheckpointStore> {
    store: S,
    policy: Box<dyn OffsetPolicy>,
}

impl<S: CheckpointStore> AuditEngine<S> {
    /// Engine with the default offset policy.
    pub fn new(store: S) -> Self {
        Self::with_policy_kind(store, OffsetPolicyKind::default())
    }

    pub fn with_policy_kind(store: S, kind: OffsetPolicyKind) -> Self {
        Self::with_policy(store, kind.policy())
    }

    pub fn with_policy(store: S, policy: Box<dyn OffsetPolicy>) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current state of `dataset`.
    pub fn status(&self, dataset: &str) -> Result<AuditStatus> {
        Ok(match self.store.load(dataset)? {
            None => AuditStatus::NotStarted,
            Some(cp) if cp.is_complete() => AuditStatus::Complete,
            Some(cp) => AuditStatus::InProgress {
                resume_index: cp.resume_index,
                total: cp.total(),
                lease: cp.lease,
            },
        })
    }

    /// Open a session on `dataset`, resuming from its checkpoint if one
    /// exists.
    ///
    /// Fails with [`SalError::CheckpointConflict`] when another session holds
    /// the lease, or when the checkpoint was made from a different source.
    pub fn start(
        &self,
        dataset: &str,
        source_hash: &str,
        records: Vec<CanonicalRecord>,
    ) -> Result<AuditSession<'_, S>> {
        if records.is_empty() {
            return Err(SalError::EmptyData(format!(
                "dataset '{}' has no records to audit",
                dataset
            )));
        }

        let mut checkpoint = match self.store.load(dataset)? {
            Some(existing) => {
                check_resumable(dataset, &existing, source_hash, records.len())?;
                info!(
                    dataset,
                    resume_index = existing.resume_index,
                    total = existing.total(),
                    "resuming audit"
                );
                existing
            }
            None => {
                info!(dataset, total = records.len(), "starting audit");
                Checkpoint::new(dataset, source_hash, records)
            }
        };

        let lease = SessionLease::acquire();
        let session_id = lease.session_id;
        checkpoint.lease = Some(lease);
        checkpoint.touch();
        self.store.save(dataset, &checkpoint)?;

        Ok(AuditSession {
            engine: self,
            checkpoint,
            session_id,
            released: false,
        })
    }

    /// Start or resume `dataset` and drive it with `responder`.
    pub fn run_audit<R: Responder + ?Sized>(
        &self,
        dataset: &str,
        source_hash: &str,
        records: Vec<CanonicalRecord>,
        responder: &mut R,
    ) -> Result<AuditOutcome> {
        self.start(dataset, source_hash, records)?.run(responder)
    }

    /// Clear a lease left behind by a session that did not exit cleanly.
    ///
    /// Returns the lease that was removed, if any.
    pub fn break_lease(&self, dataset: &str) -> Result<Option<SessionLease>> {
        let Some(mut checkpoint) = self.store.load(dataset)? else {
            return Ok(None);
        };
        let lease = checkpoint.lease.take();
        if let Some(old) = &lease {
            warn!(
                dataset,
                session = %old.session_id,
                pid = old.pid,
                "breaking audit lease taken at {}",
                old.started_at
            );
            checkpoint.touch();
            self.store.save(dataset, &checkpoint)?;
        }
        Ok(lease)
    }
}

fn check_resumable(
    dataset: &str,
    checkpoint: &Checkpoint,
    source_hash: &str,
    record_count: usize,
) -> Result<()> {
    let conflict = |reason: String| SalError::CheckpointConflict {
        dataset: dataset.to_string(),
        reason,
    };

    if let Some(lease) = &checkpoint.lease {
        return Err(conflict(format!(
            "held by session {} (pid {}) since {}; if that session is gone, unlock it",
            lease.session_id,
            lease.pid,
            format_time(lease.started_at)
        )));
    }
    if checkpoint.source_hash != source_hash {
        return Err(conflict(format!(
            "checkpoint was made from source {}, input is {}",
            checkpoint.source_hash, source_hash
        )));
    }
    if checkpoint.total() != record_count {
        return Err(conflict(format!(
            "checkpoint has {} records, input has {}",
            checkpoint.total(),
            record_count
        )));
    }
    Ok(())
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// An open audit of one dataset.
pub struct AuditSession<'a, S: CheckpointStore> {
    engine: &'a AuditEngine<S>,
    checkpoint: Checkpoint,
    session_id: Uuid,
    released: bool,
}

impl<'a, S: CheckpointStore> AuditSession<'a, S> {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn dataset(&self) -> &str {
        &self.checkpoint.dataset
    }

    /// Index of the next record to confirm.
    pub fn resume_index(&self) -> usize {
        self.checkpoint.resume_index
    }

    pub fn total(&self) -> usize {
        self.checkpoint.total()
    }

    pub fn is_complete(&self) -> bool {
        self.checkpoint.is_complete()
    }

    /// Records in their current state.
    pub fn records(&self) -> &[CanonicalRecord] {
        &self.checkpoint.records
    }

    pub fn decisions(&self) -> &[AuditDecision] {
        &self.checkpoint.decisions
    }

    /// The next record awaiting confirmation, or `None` when done.
    pub fn pending(&self) -> Option<PendingConfirmation> {
        let index = self.checkpoint.resume_index;
        let record = self.checkpoint.records.get(index)?;
        let previous = self.previous(index);

        Some(PendingConfirmation {
            index,
            total: self.checkpoint.total(),
            row: record.row,
            record: record.clone(),
            expected_pdf_start_page: self.engine.policy.expected(previous, record),
            previous_pdf_start_page: previous.and_then(|p| p.pdf_start_page),
        })
    }

    fn previous(&self, index: usize) -> Option<&CanonicalRecord> {
        index
            .checked_sub(1)
            .and_then(|i| self.checkpoint.records.get(i))
    }

    /// Apply the curator's response to the pending record and persist.
    ///
    /// If the checkpoint cannot be written the session is left unchanged.
    pub fn submit(&mut self, response: Response) -> Result<AuditDecision> {
        if self.released {
            return Err(SalError::Validation(
                "audit session has been closed".to_string(),
            ));
        }
        let pending = self.pending().ok_or_else(|| {
            SalError::Validation("all records are already audited".to_string())
        })?;

        let (status, value) = match response {
            Response::Accept => (DecisionStatus::Accepted, pending.expected_pdf_start_page),
            Response::Override(0) => {
                return Err(SalError::Validation(format!(
                    "row {}: PDF start page must be a positive integer",
                    pending.row
                )));
            }
            Response::Override(page) => (DecisionStatus::Overridden, page),
        };

        let warning = self.monotonicity(pending.index, value);
        if let Some(w) = &warning {
            warn!(dataset = %self.checkpoint.dataset, "{}", w);
        }

        let decision = AuditDecision {
            index: pending.index,
            row: pending.row,
            status,
            expected_pdf_start_page: pending.expected_pdf_start_page,
            pdf_start_page: value,
            session_id: self.session_id,
            decided_at: Utc::now(),
            warning,
        };

        let mut next = self.checkpoint.clone();
        let record = &mut next.records[pending.index];
        record.pdf_start_page = Some(value);
        record.audited = true;
        next.decisions.push(decision.clone());
        next.resume_index = pending.index + 1;
        next.touch();

        self.engine.store.save(&next.dataset, &next)?;
        self.checkpoint = next;

        debug!(
            row = decision.row,
            status = decision.status.label(),
            pdf_start_page = value,
            "{}/{} audited",
            self.checkpoint.resume_index,
            self.checkpoint.total()
        );
        Ok(decision)
    }

    fn monotonicity(&self, index: usize, value: u32) -> Option<MonotonicityWarning> {
        let previous = self.previous(index)?;
        let previous_pdf = previous.pdf_start_page?;
        (value < previous_pdf).then(|| MonotonicityWarning {
            row: self.checkpoint.records[index].row,
            pdf_start_page: value,
            previous_row: previous.row,
            previous_pdf_start_page: previous_pdf,
        })
    }

    /// Stop for now; progress stays in the checkpoint.
    pub fn suspend(mut self) -> Result<()> {
        self.release()?;
        info!(
            dataset = %self.checkpoint.dataset,
            resume_index = self.checkpoint.resume_index,
            total = self.checkpoint.total(),
            "audit suspended"
        );
        Ok(())
    }

    /// Close a completed audit, archive its checkpoint, and return the
    /// audited dataset.
    pub fn finish(self) -> Result<AuditedDataset> {
        self.finish_with(|_| Ok(()))
    }

    /// Close a completed audit, handing the audited dataset to `persist`
    /// before the checkpoint is archived.
    ///
    /// When `persist` fails the checkpoint stays active and complete, so a
    /// later session can finish it without asking the curator again.
    pub fn finish_with<F>(mut self, persist: F) -> Result<AuditedDataset>
    where
        F: FnOnce(&AuditedDataset) -> Result<()>,
    {
        if !self.checkpoint.is_complete() {
            return Err(SalError::Validation(format!(
                "{} of {} records still need review",
                self.checkpoint.total() - self.checkpoint.resume_index,
                self.checkpoint.total()
            )));
        }

        let dataset = AuditedDataset::from_checkpoint(&self.checkpoint)?;
        persist(&dataset)?;
        self.release()?;
        self.engine.store.archive(&self.checkpoint.dataset)?;

        info!(
            dataset = %dataset.dataset,
            records = dataset.len(),
            overrides = dataset.override_count(),
            "audit complete"
        );
        Ok(dataset)
    }

    /// Drive the session until the responder stops or every record is
    /// audited.
    pub fn run<R: Responder + ?Sized>(self, responder: &mut R) -> Result<AuditOutcome> {
        self.run_with(responder, |_| Ok(()))
    }

    /// Like [`AuditSession::run`], finishing through
    /// [`AuditSession::finish_with`].
    pub fn run_with<R, F>(mut self, responder: &mut R, persist: F) -> Result<AuditOutcome>
    where
        R: Responder + ?Sized,
        F: FnOnce(&AuditedDataset) -> Result<()>,
    {
        while let Some(pending) = self.pending() {
            match responder.respond(&pending)? {
                Some(response) => {
                    self.submit(response)?;
                }
                None => {
                    let resume_index = self.checkpoint.resume_index;
                    let total = self.checkpoint.total();
                    self.suspend()?;
                    return Ok(AuditOutcome::Suspended {
                        resume_index,
                        total,
                    });
                }
            }
        }
        self.finish_with(persist).map(AuditOutcome::Complete)
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        let mut released = self.checkpoint.clone();
        released.lease = None;
        released.touch();
        self.engine.store.save(&released.dataset, &released)?;
        self.checkpoint = released;
        self.released = true;
        Ok(())
    }
}

impl<S: CheckpointStore> Drop for AuditSession<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(
                dataset = %self.checkpoint.dataset,
                "failed to release audit lease: {}",
                e
            );
        }
    }
}
