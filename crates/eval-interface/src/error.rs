use eval_failure::FailureError;
use eval_partition::PartitionError;
use eval_queue::QueueError;
use eval_scheduler::SchedulerError;
use eval_types::TypesError;
use restart_journal::JournalError;
use thiserror::Error;

/// Umbrella error the façade returns, composing every lower crate's error
/// into the four kinds of §7: configuration errors surface immediately
/// from `init_communicators` and abort before any evaluation; simulator
/// failures are normally absorbed by the failure manager and only reach
/// here as diagnostics; transport failures are not recovered locally;
/// fatal errors abort after flushing completed evaluations to the journal.
#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("simulator failure: {0}")]
    SimulatorFailure(eval_types::SimFailure),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("fatal error: {0}")]
    Fatal(String),
}

impl From<PartitionError> for InterfaceError {
    fn from(e: PartitionError) -> Self {
        InterfaceError::Configuration(e.to_string())
    }
}

impl From<TypesError> for InterfaceError {
    fn from(e: TypesError) -> Self {
        InterfaceError::Configuration(e.to_string())
    }
}

impl From<QueueError> for InterfaceError {
    fn from(e: QueueError) -> Self {
        InterfaceError::Fatal(e.to_string())
    }
}

impl From<SchedulerError> for InterfaceError {
    fn from(e: SchedulerError) -> Self {
        match e {
            SchedulerError::Transport(msg) => InterfaceError::Transport(msg),
            other => InterfaceError::Fatal(other.to_string()),
        }
    }
}

impl From<JournalError> for InterfaceError {
    fn from(e: JournalError) -> Self {
        // §4.9 `cache_inconsistent`: journal replay conflicting with the
        // in-memory cache is a restart-time fatal condition.
        InterfaceError::Fatal(format!("cache_inconsistent: {e}"))
    }
}

impl From<FailureError> for InterfaceError {
    fn from(e: FailureError) -> Self {
        match &e {
            // §7: a mis-sized recovery vector is a configuration error,
            // not a policy-exhaustion fatal.
            FailureError::InvalidRecoveryVector { .. } => InterfaceError::Configuration(e.to_string()),
            _ => InterfaceError::Fatal(e.to_string()),
        }
    }
}
