//! Pipeline sessions
//!
//! A session owns the state of one pipeline (page model or merge queue),
//! the collaborators it was constructed with and a status observable.
//! Failures are reported through the status and returned; they never change
//! the state a retry would need.

pub mod action_log;
pub mod merge;
pub mod organize;
pub mod scrub;
pub mod status;

pub use action_log::{ActionLog, LoggedAction, PageAction};
pub use merge::MergeSession;
pub use organize::{OrganizeSession, Organizer};
pub use scrub::ScrubSession;
pub use status::{Status, StatusReporter};

/// Output bytes ready for download under a sanitized name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}
