use eval_partition::ServerId;

/// Unifies remote (message-passing) servers and local async-executor slots
/// under one assignment target, so peer-dynamic and local-async dispatch
/// can share the same running-map bookkeeping (resolves the source's
/// under-specified "dynamic peer + non-blocking + hybrid local async"
/// combination — see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerId {
    Remote(ServerId),
    Local(usize),
}

impl WorkerId {
    pub fn as_server_id(&self) -> Option<ServerId> {
        match self {
            WorkerId::Remote(id) => Some(*id),
            WorkerId::Local(_) => None,
        }
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerId::Remote(id) => write!(f, "remote:{id}"),
            WorkerId::Local(slot) => write!(f, "local:{slot}"),
        }
    }
}
