use eval_types::{EvalId, SimFailure, TypesError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FailureError {
    #[error("evaluation {eval_id} aborted after simulator failure: {cause}")]
    Aborted { eval_id: EvalId, cause: SimFailure },

    #[error("retry policy exhausted after {attempts} attempt(s) for eval_id {eval_id}")]
    RetryExhausted { eval_id: EvalId, attempts: usize },

    #[error("recovery vector invalid for eval_id {eval_id}: {source}")]
    InvalidRecoveryVector { eval_id: EvalId, source: TypesError },

    #[error("continuation recovery found no cached neighbour for eval_id {eval_id}")]
    NoNeighbour { eval_id: EvalId },

    #[error("continuation recovery exhausted after {attempts} attempt(s) for eval_id {eval_id}")]
    ContinuationExhausted { eval_id: EvalId, attempts: usize },
}
