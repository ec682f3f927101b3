//! Worker-side server loops (§4.7): synchronous, asynchronous, and peer
//! variants, each driving a [`eval_scheduler::LocalSimulator`] and replying
//! through the same `(WorkerId, Envelope)` wire convention the scheduler's
//! transports use. Layout picks the variant once; it never changes mid-run.

pub mod error;
pub mod loop_variant;
pub mod send_slot;
pub mod server;

pub use error::ServerError;
pub use loop_variant::ServerLoopVariant;
pub use send_slot::SendSlot;
pub use server::{run_asynchronous, run_peer, run_synchronous};
