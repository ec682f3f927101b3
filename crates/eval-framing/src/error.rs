use thiserror::Error;

#[derive(Debug, Error)]
pub enum FramingError {
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("failed to encode message: {0}")]
    Encode(String),

    #[error("failed to decode message: {0}")]
    Decode(String),

    #[error("packed message ({actual} bytes) exceeds estimated max length ({max} bytes)")]
    OversizeMessage { actual: usize, max: usize },
}
