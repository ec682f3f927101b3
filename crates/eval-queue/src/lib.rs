//! Ordered pending-evaluation queue (§4.5) plus the `history_dup` /
//! `pending_dup` maps that record duplicate-of relationships discovered
//! before dispatch (§3, §4.6).

mod duplicates;
mod error;
mod queue;

pub use duplicates::DuplicateMaps;
pub use error::QueueError;
pub use queue::PendingQueue;
