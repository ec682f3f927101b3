use crate::error::PartitionError;
use crate::level::{Level, SchedulingMode};
use crate::server_id::ServerId;

/// A resolved server layout for one parallel level (§3, §4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLayout {
    pub num_servers: usize,
    pub procs_per_server: usize,
    pub dedicated_master: bool,
    /// `Some(procs)` when `parent_size` wasn't evenly divisible and one
    /// server absorbs the remainder as a partial-sized server.
    pub partial_server_procs: Option<usize>,
    pub resolved_scheduling: SchedulingMode,
}

impl ServerLayout {
    /// Above some fan-out, a dedicated scheduling master stops being idle
    /// overhead and starts paying for itself; below it, every rank should
    /// pull its own weight as a peer. Mirrors §4.3 rule 3's guidance to
    /// "prefer peer layouts for single-digit server counts, dedicated-master
    /// for larger fan-outs."
    pub const DEDICATED_MASTER_THRESHOLD: usize = 10;

    pub fn is_peer(&self) -> bool {
        !self.dedicated_master
    }

    /// 1-indexed server ids for this layout. Rank 0 is the master under
    /// dedicated-master, otherwise a peer like any other.
    pub fn server_ids(&self) -> Vec<ServerId> {
        let start = if self.dedicated_master { 1 } else { 0 };
        (start..start + self.num_servers as u32).map(ServerId).collect()
    }
}

fn resolve_scheduling(requested: SchedulingMode, num_servers: usize) -> SchedulingMode {
    match requested {
        SchedulingMode::Auto => {
            if num_servers >= ServerLayout::DEDICATED_MASTER_THRESHOLD {
                SchedulingMode::DedicatedMaster
            } else {
                SchedulingMode::PeerStatic
            }
        }
        other => other,
    }
}

/// Resolution rules 1–4 of §4.3, applied top-down for one level.
#[allow(clippy::too_many_arguments)]
pub fn resolve_level(
    level: Level,
    parent_size: usize,
    num_servers: Option<usize>,
    procs_per_server: Option<usize>,
    dedicated_master_requested: bool,
    scheduling: SchedulingMode,
    concurrency_estimate: usize,
) -> Result<ServerLayout, PartitionError> {
    if parent_size == 0 {
        return Err(PartitionError::Configuration {
            level,
            reason: "parent communicator has zero processors".into(),
        });
    }

    let (n, p, dm) = match (num_servers, procs_per_server) {
        // Rule 1: both specified.
        (Some(n), Some(p)) => {
            if n == 0 || p == 0 {
                return Err(PartitionError::Configuration {
                    level,
                    reason: "num_servers and procs_per_server must both be > 0".into(),
                });
            }
            let dm_cost = usize::from(dedicated_master_requested);
            let needed = n * (p + dm_cost);
            if needed > parent_size {
                return Err(PartitionError::Configuration {
                    level,
                    reason: format!(
                        "{n} servers x {p} procs (+{dm_cost} dedicated master) = {needed} exceeds parent size {parent_size}"
                    ),
                });
            }
            (n, p, dedicated_master_requested)
        }
        // Rule 2: only num_servers specified — derive procs_per_server.
        (Some(n), None) => {
            if n == 0 {
                return Err(PartitionError::Configuration {
                    level,
                    reason: "num_servers must be > 0".into(),
                });
            }
            let dm_cost = usize::from(dedicated_master_requested);
            if n + dm_cost > parent_size {
                return Err(PartitionError::Configuration {
                    level,
                    reason: format!("{n} servers (+{dm_cost} dedicated master) exceeds parent size {parent_size}"),
                });
            }
            let procs = ((parent_size - dm_cost) / n).max(1);
            (n, procs, dedicated_master_requested)
        }
        // Rule 2: only procs_per_server specified — derive num_servers
        // from parent_size and the level concurrency estimate.
        (None, Some(p)) => {
            if p == 0 {
                return Err(PartitionError::Configuration {
                    level,
                    reason: "procs_per_server must be > 0".into(),
                });
            }
            let dm_cost = usize::from(dedicated_master_requested);
            if p + dm_cost > parent_size {
                return Err(PartitionError::Configuration {
                    level,
                    reason: format!("procs_per_server {p} (+{dm_cost} dedicated master) exceeds parent size {parent_size}"),
                });
            }
            let max_by_size = (parent_size - dm_cost) / p;
            let n = concurrency_estimate.max(1).min(max_by_size.max(1));
            (n, p, dedicated_master_requested)
        }
        // Rule 3: neither specified — auto-pick to minimize idle procs
        // given the level concurrency estimate.
        (None, None) => {
            let n = concurrency_estimate.max(1).min(parent_size);
            let dm = matches!(scheduling, SchedulingMode::Auto) && n >= ServerLayout::DEDICATED_MASTER_THRESHOLD
                || matches!(scheduling, SchedulingMode::DedicatedMaster);
            let dm_cost = usize::from(dm);
            let denom = n.max(1);
            let procs = ((parent_size.saturating_sub(dm_cost)) / denom).max(1);
            (n, procs, dm)
        }
    };

    let dm_cost = usize::from(dm);
    let used = n * (p + dm_cost);
    let remainder = parent_size.saturating_sub(used);
    let partial_server_procs = if remainder > 0 { Some(remainder) } else { None };

    Ok(ServerLayout {
        num_servers: n,
        procs_per_server: p,
        dedicated_master: dm,
        partial_server_procs,
        resolved_scheduling: resolve_scheduling(scheduling, n),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_specified_validates_capacity() {
        let err = resolve_level(Level::Evaluation, 8, Some(3), Some(3), false, SchedulingMode::PeerStatic, 3)
            .unwrap_err();
        assert!(matches!(err, PartitionError::Configuration { level: Level::Evaluation, .. }));
    }

    #[test]
    fn both_specified_leaves_partial_server_on_remainder() {
        let layout = resolve_level(Level::Evaluation, 10, Some(3), Some(3), false, SchedulingMode::PeerStatic, 3).unwrap();
        assert_eq!(layout.partial_server_procs, Some(1));
    }

    #[test]
    fn auto_prefers_peer_for_single_digit_fanout() {
        let layout = resolve_level(Level::Evaluation, 8, None, None, false, SchedulingMode::Auto, 4).unwrap();
        assert_eq!(layout.resolved_scheduling, SchedulingMode::PeerStatic);
        assert!(!layout.dedicated_master);
    }

    #[test]
    fn auto_prefers_dedicated_master_for_large_fanout() {
        let layout = resolve_level(Level::Evaluation, 100, None, None, false, SchedulingMode::Auto, 20).unwrap();
        assert_eq!(layout.resolved_scheduling, SchedulingMode::DedicatedMaster);
        assert!(layout.dedicated_master);
    }

    #[test]
    fn server_ids_start_at_one_under_dedicated_master() {
        let layout = ServerLayout {
            num_servers: 3,
            procs_per_server: 1,
            dedicated_master: true,
            partial_server_procs: None,
            resolved_scheduling: SchedulingMode::DedicatedMaster,
        };
        assert_eq!(layout.server_ids(), vec![ServerId(1), ServerId(2), ServerId(3)]);
    }

    #[test]
    fn server_ids_start_at_zero_for_peers() {
        let layout = ServerLayout {
            num_servers: 3,
            procs_per_server: 1,
            dedicated_master: false,
            partial_server_procs: None,
            resolved_scheduling: SchedulingMode::PeerStatic,
        };
        assert_eq!(layout.server_ids(), vec![ServerId(0), ServerId(1), ServerId(2)]);
    }
}
