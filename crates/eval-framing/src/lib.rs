//! Message framing: typed pack/unpack for parameter, active-set, and
//! response buffers, plus length estimation for receive-buffer sizing.
//! Deliberately transport-agnostic — see `eval-scheduler::transport` for
//! the send/receive verbs that move these bytes around.

pub mod envelope;
pub mod error;
pub mod lengths;
pub mod messages;

pub use envelope::{Envelope, TERMINATION_TAG};
pub use error::FramingError;
pub use lengths::LengthEstimator;
pub use messages::{
    pack_pair, pack_response, pack_vars, pack_vars_active_set, unpack_pair, unpack_response,
    unpack_vars, unpack_vars_active_set, MessageClass,
};
