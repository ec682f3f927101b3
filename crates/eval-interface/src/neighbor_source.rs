use std::sync::Arc;

use eval_cache::EvaluationCache;
use eval_failure::NearestNeighborSource;
use eval_types::{ResponseData, Variables};

/// Adapts the evaluation cache to continuation recovery's narrow
/// nearest-neighbour lookup, scanning completed pairs for the same
/// interface and picking the closest by Euclidean distance over the
/// continuous components (§4.8 "continuation(v̄)"). Linear in the number of
/// cached evaluations; fine at the scale this scheduler targets.
pub struct CacheNeighborSource {
    pub cache: Arc<EvaluationCache>,
}

impl NearestNeighborSource for CacheNeighborSource {
    fn nearest(&self, interface_id: &str, target: &Variables) -> Option<(Variables, ResponseData)> {
        let mut best: Option<(f64, Variables, ResponseData)> = None;
        for eval_id in self.cache.ordered_eval_ids() {
            let Some(pair) = self.cache.lookup_by_eval_id(eval_id) else {
                continue;
            };
            if pair.interface_id != interface_id {
                continue;
            }
            let dist = pair.vars.continuous_distance(target);
            let is_better = best.as_ref().map(|(d, _, _)| dist < *d).unwrap_or(true);
            if is_better {
                best = Some((dist, pair.vars.clone(), pair.response.get()));
            }
        }
        best.map(|(_, v, r)| (v, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eval_types::{ActiveSet, Pair, Response};

    fn insert(cache: &EvaluationCache, eval_id: eval_types::EvalId, x: f64, value: f64) {
        let active_set = ActiveSet::values_only(1);
        let response = Response::new_owning(active_set.clone(), ResponseData::new(vec![value], vec![], vec![]));
        cache.insert(Pair::new(eval_id, "rosenbrock", Variables::new(vec![x], vec![], vec![]), active_set, response));
    }

    #[test]
    fn finds_closest_by_continuous_distance() {
        let cache = Arc::new(EvaluationCache::new());
        insert(&cache, 1, 0.0, 10.0);
        insert(&cache, 2, 5.0, 20.0);
        let source = CacheNeighborSource { cache };
        let (v, r) = source.nearest("rosenbrock", &Variables::new(vec![4.0], vec![], vec![])).unwrap();
        assert_eq!(v.continuous, vec![5.0]);
        assert_eq!(r.values, vec![20.0]);
    }

    #[test]
    fn ignores_other_interfaces() {
        let cache = Arc::new(EvaluationCache::new());
        insert(&cache, 1, 0.0, 10.0);
        let source = CacheNeighborSource { cache };
        assert!(source.nearest("other_sim", &Variables::new(vec![0.0], vec![], vec![])).is_none());
    }
}
