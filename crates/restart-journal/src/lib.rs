//! Append-only binary restart log (C2): replaying a prior journal
//! reconstitutes the evaluation cache so an interrupted run can resume
//! without re-executing already-completed simulations.

pub mod error;
pub mod format;
pub mod journal;

pub use error::JournalError;
pub use journal::RestartJournal;
