//! Content-addressed cache of completed evaluations (C1). Thread-agnostic:
//! intended to be driven from the iterator thread only, wrapped in an `Arc`
//! when shared across interface instances with the same `interface_id`.

pub mod cache;
pub mod error;
pub mod policy;

pub use cache::EvaluationCache;
pub use error::CacheError;
pub use policy::{NoOverlay, PartialCandidate, PartialMatchPolicy, SupersetSlice};
