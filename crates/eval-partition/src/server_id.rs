use serde::{Deserialize, Serialize};

/// 1-indexed within an evaluation level; rank 0 is the master under
/// dedicated-master, otherwise a peer (§3 "Server identity").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerId(pub u32);

impl ServerId {
    pub fn peer_zero() -> Self {
        ServerId(0)
    }
}

impl std::fmt::Display for ServerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "server#{}", self.0)
    }
}
