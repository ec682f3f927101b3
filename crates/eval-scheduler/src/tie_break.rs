use eval_partition::ServerId;

/// Breaks ties among equally-loaded free servers during non-blocking
/// backfill. The source marks this choice "approach 2" without naming
/// alternatives (§9 open question); this names it as a policy with at
/// least two implementations.
pub trait TieBreakPolicy: Send + Sync {
    /// `free` is the set of currently unassigned, available servers, most
    /// recently observed free server first is not assumed — implementations
    /// must not rely on `free`'s order beyond what they document.
    fn pick(&mut self, free: &[ServerId]) -> Option<ServerId>;
}

/// Deterministic: always the numerically lowest free server id. Matches
/// the tie-break rule given for master-dynamic dispatch (§4.6).
#[derive(Debug, Default)]
pub struct LowestServerId;

impl TieBreakPolicy for LowestServerId {
    fn pick(&mut self, free: &[ServerId]) -> Option<ServerId> {
        free.iter().copied().min()
    }
}

/// Rotates starting just after the last server it picked, so repeated
/// ties spread load round-robin instead of always favoring the lowest id.
#[derive(Debug, Default)]
pub struct RoundRobinFromLast {
    last: Option<ServerId>,
}

impl TieBreakPolicy for RoundRobinFromLast {
    fn pick(&mut self, free: &[ServerId]) -> Option<ServerId> {
        if free.is_empty() {
            return None;
        }
        let mut sorted: Vec<ServerId> = free.to_vec();
        sorted.sort();
        let next = match self.last {
            Some(last) => sorted.iter().find(|id| **id > last).copied().unwrap_or(sorted[0]),
            None => sorted[0],
        };
        self.last = Some(next);
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowest_server_id_always_picks_minimum() {
        let mut policy = LowestServerId;
        let free = vec![ServerId(3), ServerId(1), ServerId(2)];
        assert_eq!(policy.pick(&free), Some(ServerId(1)));
        assert_eq!(policy.pick(&free), Some(ServerId(1)));
    }

    #[test]
    fn round_robin_advances_past_last_pick() {
        let mut policy = RoundRobinFromLast::default();
        let free = vec![ServerId(0), ServerId(1), ServerId(2)];
        assert_eq!(policy.pick(&free), Some(ServerId(0)));
        assert_eq!(policy.pick(&free), Some(ServerId(1)));
        assert_eq!(policy.pick(&free), Some(ServerId(2)));
        assert_eq!(policy.pick(&free), Some(ServerId(0)));
    }
}
