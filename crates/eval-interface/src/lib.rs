//! Public façade (C9): the only crate most embedders depend on directly.
//! Composes `eval-cache`, `restart-journal`, `eval-partition`,
//! `eval-scheduler`, and `eval-failure` behind `map`/`synchronize`/
//! `synchronize_nowait`/`init_communicators`/`set_communicators`/
//! `stop_evaluation_servers` (§4.9, §6).

pub mod config;
pub mod error;
pub mod evaluate_adapter;
pub mod facade;
pub mod neighbor_source;

pub use config::DriverConfig;
pub use error::InterfaceError;
pub use evaluate_adapter::SimulatorEvaluateAdapter;
pub use facade::EvalInterface;
pub use neighbor_source::CacheNeighborSource;
