use eval_types::{ResponseData, Variables};

/// Supplies the nearest-neighbour completed `V` for continuation recovery.
/// Implemented by the façade crate over the evaluation cache, so this
/// crate never has to depend on `eval-cache` directly — the manager only
/// needs "is there a nearby completed point, and what did it return"
/// (§4.8 "continuation(v̄)").
pub trait NearestNeighborSource: Send + Sync {
    /// Returns the cached `(V, R)` pair for `interface_id` with the
    /// smallest Euclidean distance (over continuous components) to
    /// `target`, or `None` if the cache holds nothing for that interface.
    fn nearest(&self, interface_id: &str, target: &Variables) -> Option<(Variables, ResponseData)>;
}
