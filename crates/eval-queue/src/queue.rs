use std::collections::HashMap;

use eval_types::{EvalId, Fingerprint, Pair};
use tracing::debug;

use crate::error::QueueError;

/// Ordered multiset of [`Pair`]s awaiting dispatch or in flight, with an
/// O(1) fingerprint index for duplicate detection. Iteration order is
/// insertion order, which static scheduling policies depend on (§4.5, §9).
#[derive(Debug, Default)]
pub struct PendingQueue {
    order: Vec<EvalId>,
    by_eval_id: HashMap<EvalId, Pair>,
    by_fingerprint: HashMap<Fingerprint, EvalId>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, pair: Pair) -> Result<(), QueueError> {
        let eval_id = pair.eval_id;
        if self.by_eval_id.contains_key(&eval_id) {
            return Err(QueueError::DuplicateEvalId(eval_id));
        }
        self.by_fingerprint.insert(pair.fingerprint(), eval_id);
        self.order.push(eval_id);
        self.by_eval_id.insert(eval_id, pair);
        debug!(eval_id, "enqueued");
        Ok(())
    }

    /// Removes and returns the entry once its response has been delivered
    /// upstream (§4.5: "removed only when its response is delivered").
    pub fn dequeue(&mut self, eval_id: EvalId) -> Result<Pair, QueueError> {
        let pair = self
            .by_eval_id
            .remove(&eval_id)
            .ok_or(QueueError::NotFound(eval_id))?;
        self.by_fingerprint.remove(&pair.fingerprint());
        self.order.retain(|id| *id != eval_id);
        Ok(pair)
    }

    pub fn find_by_fingerprint(&self, fingerprint: &Fingerprint) -> Option<EvalId> {
        self.by_fingerprint.get(fingerprint).copied()
    }

    pub fn find_by_eval_id(&self, eval_id: EvalId) -> Option<&Pair> {
        self.by_eval_id.get(&eval_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Insertion-order iteration, required for static scheduling.
    pub fn iter_in_order(&self) -> impl Iterator<Item = &Pair> {
        self.order.iter().filter_map(move |id| self.by_eval_id.get(id))
    }

    pub fn eval_ids_in_order(&self) -> &[EvalId] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eval_types::{ActiveSet, Response, ResponseData, Variables};

    fn pair(eval_id: EvalId) -> Pair {
        let vars = Variables::new(vec![eval_id as f64], vec![], vec![]);
        let active_set = ActiveSet::values_only(1);
        let response = Response::new_owning(active_set.clone(), ResponseData::default());
        Pair::new(eval_id, "sim", vars, active_set, response)
    }

    #[test]
    fn enqueue_preserves_insertion_order() {
        let mut q = PendingQueue::new();
        q.enqueue(pair(3)).unwrap();
        q.enqueue(pair(1)).unwrap();
        q.enqueue(pair(2)).unwrap();
        assert_eq!(q.eval_ids_in_order(), &[3, 1, 2]);
    }

    #[test]
    fn duplicate_eval_id_rejected() {
        let mut q = PendingQueue::new();
        q.enqueue(pair(1)).unwrap();
        assert!(matches!(q.enqueue(pair(1)), Err(QueueError::DuplicateEvalId(1))));
    }

    #[test]
    fn fingerprint_lookup_finds_enqueued_entry() {
        let mut q = PendingQueue::new();
        let p = pair(5);
        let fp = p.fingerprint();
        q.enqueue(p).unwrap();
        assert_eq!(q.find_by_fingerprint(&fp), Some(5));
    }

    #[test]
    fn dequeue_removes_from_all_indices() {
        let mut q = PendingQueue::new();
        let p = pair(7);
        let fp = p.fingerprint();
        q.enqueue(p).unwrap();
        q.dequeue(7).unwrap();
        assert!(q.is_empty());
        assert_eq!(q.find_by_fingerprint(&fp), None);
    }

    #[test]
    fn dequeue_unknown_eval_id_errors() {
        let mut q = PendingQueue::new();
        assert!(matches!(q.dequeue(42), Err(QueueError::NotFound(42))));
    }
}
