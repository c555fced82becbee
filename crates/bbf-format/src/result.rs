//! Serializable search-result and resume-vector records (`SPEC_FULL.md`
//! §1's "Serialization" item). These are the on-disk shape of a
//! `bbf_scheduler::SearchReport`; the conversion happens in `bbf-cli` so
//! this crate stays decoupled from the scheduler.

use serde::{Deserialize, Serialize};

/// One non-empty step-count histogram bucket: `(lower_bound_inclusive, count)`.
pub type HistogramBucket = (u64, u64);

/// On-disk summary of one completed (or budget-stopped) exhaustive search.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResultRecord {
    pub width: u8,
    pub height: u8,
    pub data_size: usize,
    pub best_steps: u64,
    /// The best program found, in [`crate::program::encode`] textual form.
    pub best_program: Option<String>,
    pub total_done: u64,
    pub total_errors: u64,
    pub total_hangs_detected: u64,
    pub total_hangs_assumed: u64,
    pub histogram: Vec<HistogramBucket>,
    pub total_budget_exceeded: bool,
}

/// On-disk resume vector: one rotation amount (`0..3`) per search depth,
/// `spec.md` §6's "Resume vector".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResumeVectorRecord {
    pub width: u8,
    pub height: u8,
    pub choices: Vec<u8>,
}
