use eval_types::{ActiveSet, ResponseData};

/// A candidate previously-completed pair considered for a partial-duplicate
/// lookup: its active set (a superset of what's wanted) and its response.
pub struct PartialCandidate<'a> {
    pub active_set: &'a ActiveSet,
    pub response: &'a ResponseData,
}

/// Resolves how a subset request (same `interface_id`/`V`, an active set
/// that is a subset of a cached entry's) is serviced from that cached
/// entry instead of a new simulation. Left as a policy hook per the
/// source's own open question on overlay semantics — see SPEC_FULL.md.
pub trait PartialMatchPolicy: Send + Sync {
    /// `candidates` are already filtered to entries whose active set is a
    /// strict superset of `want`, most-recently-inserted last. Returns the
    /// response to serve (and the active set it was produced under), or
    /// `None` to fall back to a full cache miss.
    fn overlay(&self, want: &ActiveSet, candidates: &[PartialCandidate<'_>]) -> Option<(ResponseData, ActiveSet)>;
}

/// Default policy: never services a partial duplicate from cache. A subset
/// request is always treated as a miss and re-evaluated.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOverlay;

impl PartialMatchPolicy for NoOverlay {
    fn overlay(&self, _want: &ActiveSet, _candidates: &[PartialCandidate<'_>]) -> Option<(ResponseData, ActiveSet)> {
        None
    }
}

/// Services the request from the most recently inserted superset
/// candidate. Since every response already carries full per-response
/// value/gradient/Hessian arrays (zero-length where not requested), the
/// superset's `ResponseData` already contains everything the subset
/// request needs — no physical slicing is required, only bookkeeping of
/// which active set produced it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SupersetSlice;

impl PartialMatchPolicy for SupersetSlice {
    fn overlay(&self, _want: &ActiveSet, candidates: &[PartialCandidate<'_>]) -> Option<(ResponseData, ActiveSet)> {
        candidates
            .last()
            .map(|c| (c.response.clone(), c.active_set.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eval_types::request_bits;

    #[test]
    fn no_overlay_always_misses() {
        let set = ActiveSet::new(vec![request_bits::ALL], vec![0]);
        let data = ResponseData::new(vec![1.0], vec![vec![0.1]], vec![]);
        let candidates = vec![PartialCandidate {
            active_set: &set,
            response: &data,
        }];
        assert!(NoOverlay.overlay(&ActiveSet::values_only(1), &candidates).is_none());
    }

    #[test]
    fn superset_slice_returns_most_recent() {
        let set = ActiveSet::new(vec![request_bits::ALL], vec![0]);
        let data = ResponseData::new(vec![1.0], vec![vec![0.1]], vec![]);
        let candidates = vec![PartialCandidate {
            active_set: &set,
            response: &data,
        }];
        let (resp, used_set) = SupersetSlice.overlay(&ActiveSet::values_only(1), &candidates).unwrap();
        assert_eq!(resp.values, vec![1.0]);
        assert_eq!(used_set, set);
    }
}
