//! Nested iterator/evaluation/analysis communicator layouts and the
//! dedicated-master vs peer scheduling resolution rules that size them.

mod error;
mod layout;
mod level;
mod partition;
mod server_id;

pub use error::PartitionError;
pub use layout::{resolve_level, ServerLayout};
pub use level::{Level, LevelState, SchedulingMode};
pub use partition::{Partition, PartitionConfig, SchedulingModeConfig};
pub use server_id::ServerId;
