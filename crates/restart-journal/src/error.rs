use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal missing DAKR magic header")]
    BadMagic,

    #[error("journal version {found} unsupported (expected {expected})")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("journal record corrupt: {0}")]
    Corrupt(String),

    #[error("failed to encode restart record: {0}")]
    Encode(String),

    #[error("failed to decode restart record: {0}")]
    Decode(String),
}
