use thiserror::Error;

/// Errors raised while constructing or validating the data model types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("active set requests {actual} responses, interface has {expected}")]
    ActiveSetArityMismatch { expected: usize, actual: usize },

    #[error("derivative variable index out of range (num_vars = {num_vars})")]
    DerivativeVariableOutOfRange { num_vars: usize },

    #[error("active set request code must be in 0..=7")]
    InvalidRequestCode,

    #[error("recovery vector length {actual} does not match response arity {expected}")]
    RecoveryVectorLengthMismatch { expected: usize, actual: usize },
}
