//! Resume-from-cursor decisions.
//!
//! Input lines are numbered by a 0-based counter that advances once per line
//! read, whatever happens to the line. A run started with cursor `K` leaves
//! every line numbered below `K` alone, so restarting after a crash at line
//! `K` picks up exactly where the previous run stopped.

/// What to do with the line at a given counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeDecision {
    /// The line precedes the cursor; make no store or ledger calls.
    Skip,
    /// The line is at or past the cursor.
    Process,
}

/// Compares line counters against a fixed starting cursor.
///
/// # Examples
/// ```
/// use geozip_ingest::{ResumeController, ResumeDecision};
///
/// let resume = ResumeController::new(5);
/// assert_eq!(resume.decide(4), ResumeDecision::Skip);
/// assert_eq!(resume.decide(5), ResumeDecision::Process);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResumeController {
    cursor: u64,
}

impl ResumeController {
    /// Controller that skips every counter below `cursor`.
    #[must_use]
    pub const fn new(cursor: u64) -> Self {
        Self { cursor }
    }

    /// Cursor the controller was built with.
    #[must_use]
    pub const fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Decide whether the line at `counter` is processed.
    #[must_use]
    pub const fn decide(&self, counter: u64) -> ResumeDecision {
        if counter < self.cursor {
            ResumeDecision::Skip
        } else {
            ResumeDecision::Process
        }
    }
}
