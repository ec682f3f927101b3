use std::collections::HashMap;
use std::sync::RwLock;

use eval_types::{EvalId, Fingerprint, Pair, ResponseData};

use crate::policy::{NoOverlay, PartialCandidate, PartialMatchPolicy};

struct Inner {
    by_fingerprint: HashMap<Fingerprint, EvalId>,
    by_eval_id: HashMap<EvalId, Pair>,
    /// Insertion order, for ordered iteration (§3).
    order: Vec<EvalId>,
}

impl Inner {
    fn new() -> Self {
        Self {
            by_fingerprint: HashMap::new(),
            by_eval_id: HashMap::new(),
            order: Vec::new(),
        }
    }
}

/// Multi-indexed, insert-only collection of completed [`Pair`]s. Accessed
/// from the iterator thread only (§4.1) — the `RwLock` exists so the cache
/// can be held behind an `Arc` and shared across interface instances with
/// the same `interface_id`, per the design notes' "reference-counted
/// resource, not a singleton" guidance, not because of real contention.
pub struct EvaluationCache {
    inner: RwLock<Inner>,
    partial_policy: Box<dyn PartialMatchPolicy>,
}

impl std::fmt::Debug for EvaluationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationCache")
            .field("len", &self.len())
            .finish()
    }
}

impl Default for EvaluationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationCache {
    /// Default cache: no partial-duplicate overlay (subset requests miss).
    pub fn new() -> Self {
        Self::with_partial_policy(Box::new(NoOverlay))
    }

    pub fn with_partial_policy(partial_policy: Box<dyn PartialMatchPolicy>) -> Self {
        Self {
            inner: RwLock::new(Inner::new()),
            partial_policy,
        }
    }

    /// Lookup by fingerprint; returns the most recently inserted exact match.
    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<ResponseData> {
        let inner = self.inner.read().unwrap();
        let eval_id = *inner.by_fingerprint.get(fingerprint)?;
        inner.by_eval_id.get(&eval_id).map(|p| p.response.get())
    }

    /// Subset-request lookup: finds a cached entry with the same
    /// interface/variables but a superset active set, and asks the
    /// configured [`PartialMatchPolicy`] whether to serve it.
    pub fn lookup_partial(&self, fingerprint: &Fingerprint) -> Option<(ResponseData, eval_types::ActiveSet)> {
        let inner = self.inner.read().unwrap();
        let mut candidates_data = Vec::new();
        for eval_id in &inner.order {
            let Some(pair) = inner.by_eval_id.get(eval_id) else { continue };
            if pair.interface_id != fingerprint.interface_id || pair.vars != fingerprint.vars {
                continue;
            }
            if !fingerprint.active_set.is_subset_of(&pair.active_set) {
                continue;
            }
            candidates_data.push((pair.active_set.clone(), pair.response.get()));
        }
        let candidates: Vec<PartialCandidate<'_>> = candidates_data
            .iter()
            .map(|(set, data)| PartialCandidate {
                active_set: set,
                response: data,
            })
            .collect();
        self.partial_policy.overlay(&fingerprint.active_set, &candidates)
    }

    pub fn lookup_by_eval_id(&self, eval_id: EvalId) -> Option<Pair> {
        self.inner.read().unwrap().by_eval_id.get(&eval_id).cloned()
    }

    /// Inserts a completed pair. The cache is insert-only: a later insert
    /// under the same fingerprint shadows the earlier one for `lookup`,
    /// but both remain reachable by eval_id and in ordered iteration.
    pub fn insert(&self, pair: Pair) {
        let mut inner = self.inner.write().unwrap();
        let fingerprint = pair.fingerprint();
        let eval_id = pair.eval_id;
        inner.by_fingerprint.insert(fingerprint, eval_id);
        inner.order.push(eval_id);
        inner.by_eval_id.insert(eval_id, pair);
        tracing::debug!(eval_id, "inserted evaluation into cache");
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().by_eval_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Eval_ids in insertion order.
    pub fn ordered_eval_ids(&self) -> Vec<EvalId> {
        self.inner.read().unwrap().order.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::SupersetSlice;
    use eval_types::{request_bits, ActiveSet, Response, ResponseData, Variables};

    fn pair(eval_id: EvalId, value: f64, set: ActiveSet) -> Pair {
        let response = Response::new_owning(set.clone(), ResponseData::new(vec![value], vec![], vec![]));
        Pair::new(eval_id, "rosenbrock", Variables::new(vec![1.0], vec![], vec![]), set, response)
    }

    #[test]
    fn exact_lookup_hits_after_insert() {
        let cache = EvaluationCache::new();
        let p = pair(1, 4.2, ActiveSet::values_only(1));
        let fp = p.fingerprint();
        cache.insert(p);
        assert_eq!(cache.lookup(&fp).unwrap().values, vec![4.2]);
    }

    #[test]
    fn lookup_by_eval_id_and_ordering() {
        let cache = EvaluationCache::new();
        cache.insert(pair(1, 1.0, ActiveSet::values_only(1)));
        cache.insert(pair(2, 2.0, ActiveSet::values_only(1)));
        assert_eq!(cache.lookup_by_eval_id(2).unwrap().response.get().values, vec![2.0]);
        assert_eq!(cache.ordered_eval_ids(), vec![1, 2]);
    }

    #[test]
    fn default_policy_misses_on_subset_request() {
        let cache = EvaluationCache::new();
        let full = ActiveSet::new(vec![request_bits::ALL], vec![0]);
        cache.insert(pair(1, 4.2, full));
        let subset_fp = eval_types::Fingerprint::new(
            "rosenbrock",
            Variables::new(vec![1.0], vec![], vec![]),
            ActiveSet::values_only(1),
        );
        assert!(cache.lookup_partial(&subset_fp).is_none());
    }

    #[test]
    fn superset_slice_policy_services_subset_request() {
        let cache = EvaluationCache::with_partial_policy(Box::new(SupersetSlice));
        let full = ActiveSet::new(vec![request_bits::ALL], vec![0]);
        cache.insert(pair(1, 4.2, full));
        let subset_fp = eval_types::Fingerprint::new(
            "rosenbrock",
            Variables::new(vec![1.0], vec![], vec![]),
            ActiveSet::values_only(1),
        );
        let (resp, _) = cache.lookup_partial(&subset_fp).unwrap();
        assert_eq!(resp.values, vec![4.2]);
    }
}
