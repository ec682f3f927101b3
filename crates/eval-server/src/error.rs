use eval_framing::FramingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("transport error: {0}")]
    Transport(String),
}
