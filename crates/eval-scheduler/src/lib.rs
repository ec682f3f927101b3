//! Dispatches the pending queue across evaluation servers or local async
//! slots (§4.6). Owns the five dispatch policies, the worker/transport
//! abstraction, and the tie-break policy for non-blocking backfill; knows
//! nothing about caching, restart journaling, or the façade's duplicate
//! detection against history — those live in `eval-cache`, `restart-journal`,
//! and `eval-interface` respectively.

pub mod error;
pub mod local;
pub mod outcome;
pub mod policy;
pub mod scheduler;
pub mod simulator;
pub mod tie_break;
pub mod transport;
pub mod worker;

pub use error::SchedulerError;
pub use local::{LocalAsyncMode, LocalExecutor, SimOutcome};
pub use outcome::{decode_outcome, encode_outcome};
pub use policy::{select_dispatch_policy, DispatchPolicy};
pub use scheduler::Scheduler;
pub use simulator::LocalSimulator;
pub use tie_break::{LowestServerId, RoundRobinFromLast, TieBreakPolicy};
pub use transport::{ChannelTransport, Transport};
pub use worker::WorkerId;
