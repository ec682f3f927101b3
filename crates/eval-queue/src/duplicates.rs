use std::collections::HashMap;

use eval_types::{EvalId, ResponseData};

/// A dependent eval_id resolved from an in-flight entry, pending the
/// source job's completion (§3 `pending_dup`).
#[derive(Debug, Clone)]
struct PendingEntry {
    source_eval_id: EvalId,
    resolved: Option<ResponseData>,
}

/// Tracks duplicate-of relationships discovered before dispatch (§3, §4.6
/// "Duplicate handling during dispatch"):
/// - `history_dup`: satisfied immediately from the cache.
/// - `pending_dup`: satisfied from an in-flight queue entry once it completes.
#[derive(Debug, Default)]
pub struct DuplicateMaps {
    history_dup: HashMap<EvalId, ResponseData>,
    pending_dup: HashMap<EvalId, PendingEntry>,
}

impl DuplicateMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_history_dup(&mut self, eval_id: EvalId, response: ResponseData) {
        self.history_dup.insert(eval_id, response);
    }

    pub fn history_dup(&self, eval_id: EvalId) -> Option<&ResponseData> {
        self.history_dup.get(&eval_id)
    }

    /// Records that `dependent` is a duplicate of the still-in-flight
    /// `source_eval_id`. Not yet resolvable.
    pub fn record_pending_dup(&mut self, dependent: EvalId, source_eval_id: EvalId) {
        self.pending_dup.insert(
            dependent,
            PendingEntry {
                source_eval_id,
                resolved: None,
            },
        );
    }

    /// Called when `source_eval_id`'s job completes: clones `response` into
    /// every entry waiting on it and returns their eval_ids.
    pub fn resolve_pending_dups_for(&mut self, source_eval_id: EvalId, response: &ResponseData) -> Vec<EvalId> {
        let mut resolved = Vec::new();
        for (dependent, entry) in self.pending_dup.iter_mut() {
            if entry.source_eval_id == source_eval_id && entry.resolved.is_none() {
                entry.resolved = Some(response.clone());
                resolved.push(*dependent);
            }
        }
        resolved
    }

    /// Removes and returns a pending-dup entry's response once resolved.
    pub fn take_resolved_pending_dup(&mut self, eval_id: EvalId) -> Option<ResponseData> {
        let entry = self.pending_dup.get(&eval_id)?;
        if entry.resolved.is_some() {
            self.pending_dup.remove(&eval_id).and_then(|e| e.resolved)
        } else {
            None
        }
    }

    pub fn is_pending_dup(&self, eval_id: EvalId) -> bool {
        self.pending_dup.contains_key(&eval_id)
    }

    pub fn clear(&mut self) {
        self.history_dup.clear();
        self.pending_dup.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_dup_records_and_reads() {
        let mut dups = DuplicateMaps::new();
        dups.record_history_dup(1, ResponseData::new(vec![1.0], vec![], vec![]));
        assert_eq!(dups.history_dup(1).unwrap().values, vec![1.0]);
    }

    #[test]
    fn pending_dup_resolves_when_source_completes() {
        let mut dups = DuplicateMaps::new();
        dups.record_pending_dup(2, 1);
        dups.record_pending_dup(3, 1);
        assert!(dups.take_resolved_pending_dup(2).is_none());

        let response = ResponseData::new(vec![9.0], vec![], vec![]);
        let resolved = dups.resolve_pending_dups_for(1, &response);
        assert_eq!(resolved.len(), 2);

        let r2 = dups.take_resolved_pending_dup(2).unwrap();
        assert_eq!(r2.values, vec![9.0]);
        assert!(!dups.is_pending_dup(2));
        assert!(dups.is_pending_dup(3));
    }

    #[test]
    fn unrelated_source_does_not_resolve() {
        let mut dups = DuplicateMaps::new();
        dups.record_pending_dup(2, 1);
        let resolved = dups.resolve_pending_dups_for(99, &ResponseData::default());
        assert!(resolved.is_empty());
    }
}
