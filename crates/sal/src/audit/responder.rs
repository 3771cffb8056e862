//! Sources of curator responses.

use std::collections::VecDeque;

use crate::error::Result;
use crate::record::CanonicalRecord;

use super::decision::Response;

/// A record waiting for the curator, with the page the policy proposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    /// Position in the dataset, from 0.
    pub index: usize,
    /// Records in the dataset.
    pub total: usize,
    /// Spreadsheet row.
    pub row: usize,
    pub record: CanonicalRecord,
    pub expected_pdf_start_page: u32,
    /// Confirmed start page of the record before this one.
    pub previous_pdf_start_page: Option<u32>,
}

impl PendingConfirmation {
    /// Citation of the statute under review.
    pub fn citation(&self) -> String {
        self.record.citation()
    }

    /// One-based progress, e.g. `(3/120)`.
    pub fn progress(&self) -> String {
        format!("({}/{})", self.index + 1, self.total)
    }
}

/// Answers pending confirmations.
///
/// Returning `Ok(None)` stops the session and keeps the progress made so far.
pub trait Responder {
    fn respond(&mut self, pending: &PendingConfirmation) -> Result<Option<Response>>;
}

/// Replays a fixed list of responses, then stops.
#[derive(Debug, Clone, Default)]
pub struct ScriptedResponder {
    responses: VecDeque<Response>,
}

impl ScriptedResponder {
    pub fn new(responses: impl IntoIterator<Item = Response>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
        }
    }

    /// Accept `n` records.
    pub fn accept_all(n: usize) -> Self {
        Self::new(std::iter::repeat_n(Response::Accept, n))
    }

    pub fn remaining(&self) -> usize {
        self.responses.len()
    }
}

impl Responder for ScriptedResponder {
    fn respond(&mut self, _pending: &PendingConfirmation) -> Result<Option<Response>> {
        Ok(self.responses.pop_front())
    }
}

impl<F> Responder for F
where
    F: FnMut(&PendingConfirmation) -> Result<Option<Response>>,
{
    fn respond(&mut self, pending: &PendingConfirmation) -> Result<Option<Response>> {
        self(pending)
    }
}
