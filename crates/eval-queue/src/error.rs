use eval_types::EvalId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("eval_id {0} is not present in the pending queue")]
    NotFound(EvalId),
    #[error("eval_id {0} was enqueued twice")]
    DuplicateEvalId(EvalId),
}
