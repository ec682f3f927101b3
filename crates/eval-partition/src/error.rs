use thiserror::Error;

use crate::level::Level;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartitionError {
    #[error("configuration error at {level:?} level: {reason}")]
    Configuration { level: Level, reason: String },
}
