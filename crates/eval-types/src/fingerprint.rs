use crate::active_set::ActiveSet;
use crate::variables::Variables;

/// Derived from `(interface_id, V, S)`. Two pairs with the same
/// fingerprint are exact duplicates for cache purposes (§3, §4.1).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub interface_id: String,
    pub vars: Variables,
    pub active_set: ActiveSet,
}

impl Fingerprint {
    pub fn new(interface_id: impl Into<String>, vars: Variables, active_set: ActiveSet) -> Self {
        Self {
            interface_id: interface_id.into(),
            vars,
            active_set,
        }
    }
}
