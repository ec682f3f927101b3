//! Core data model for the evaluation scheduler: [`Variables`], [`ActiveSet`],
//! [`Response`], [`Pair`], and [`Fingerprint`]. Zero knowledge of scheduling,
//! caching, or transport lives here — every other crate in the workspace
//! depends on this one.

pub mod active_set;
pub mod error;
pub mod fingerprint;
pub mod pair;
pub mod response;
pub mod sim_failure;
pub mod variables;

pub use active_set::{request_bits, ActiveSet};
pub use error::TypesError;
pub use fingerprint::Fingerprint;
pub use pair::{EvalId, Pair, PairRecord};
pub use response::{Response, ResponseData};
pub use sim_failure::SimFailure;
pub use variables::Variables;
