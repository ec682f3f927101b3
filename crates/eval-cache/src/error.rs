use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache lock was poisoned by a panicking holder")]
    Poisoned,
}
