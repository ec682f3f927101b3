use serde::{Deserialize, Serialize};

use crate::active_set::ActiveSet;
use crate::fingerprint::Fingerprint;
use crate::response::{Response, ResponseData};
use crate::variables::Variables;

/// Assigned at enqueue time; negative values are reserved for
/// restart-imported history (§3).
pub type EvalId = i32;

/// The fundamental unit of work and of history: `⟨V, interface_id, S, R, eval_id⟩`.
#[derive(Debug, Clone)]
pub struct Pair {
    pub eval_id: EvalId,
    pub interface_id: String,
    pub vars: Variables,
    pub active_set: ActiveSet,
    pub response: Response,
}

impl Pair {
    pub fn new(
        eval_id: EvalId,
        interface_id: impl Into<String>,
        vars: Variables,
        active_set: ActiveSet,
        response: Response,
    ) -> Self {
        Self {
            eval_id,
            interface_id: interface_id.into(),
            vars,
            active_set,
            response,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(self.interface_id.clone(), self.vars.clone(), self.active_set.clone())
    }
}

/// Flattened, serializable form of a [`Pair`], used by the restart journal
/// and the message-framing wire format — `Response`'s `Arc<Mutex<_>>`
/// storage isn't itself serializable, so records carry a plain snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairRecord {
    pub eval_id: EvalId,
    pub interface_id: String,
    pub vars: Variables,
    pub active_set: ActiveSet,
    pub response: ResponseData,
}

impl PairRecord {
    pub fn from_pair(pair: &Pair) -> Self {
        Self {
            eval_id: pair.eval_id,
            interface_id: pair.interface_id.clone(),
            vars: pair.vars.clone(),
            active_set: pair.active_set.clone(),
            response: pair.response.get(),
        }
    }

    pub fn into_pair(self) -> Pair {
        let response = Response::new_owning(self.active_set.clone(), self.response);
        Pair::new(self.eval_id, self.interface_id, self.vars, self.active_set, response)
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(self.interface_id.clone(), self.vars.clone(), self.active_set.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::active_set::ActiveSet;

    #[test]
    fn record_round_trip_preserves_fingerprint() {
        let response = Response::new_owning(ActiveSet::values_only(1), ResponseData::new(vec![3.0], vec![], vec![]));
        let pair = Pair::new(1, "rosenbrock", Variables::new(vec![1.0], vec![], vec![]), ActiveSet::values_only(1), response);
        let fp_before = pair.fingerprint();
        let record = PairRecord::from_pair(&pair);
        let restored = record.into_pair();
        assert_eq!(fp_before, restored.fingerprint());
        assert_eq!(restored.response.get().values, vec![3.0]);
    }
}
