use serde::{Deserialize, Serialize};

/// A parallel level in the iterator → evaluation servers → analysis
/// servers nesting (§3). `Strategy` sits above the iterator level for
/// multi-iterator strategies (hybrid, multi-start) but is otherwise
/// unused by a single-iterator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Strategy,
    Iterator,
    Evaluation,
    Analysis,
}

/// Scheduling directive for a level, as supplied by the user/input parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    DedicatedMaster,
    PeerDynamic,
    PeerStatic,
    Auto,
}

/// Per-level lifecycle (§4.3). Re-entry (an outer iterator re-invoking an
/// inner one) returns to `Active` without rebuilding communicators when
/// the request is identical — see [`crate::partition::Partition::set_communicators`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelState {
    Uninitialized,
    Initializing,
    Active,
    Freed,
}
