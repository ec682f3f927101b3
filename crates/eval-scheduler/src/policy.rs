use eval_partition::{ServerLayout, SchedulingMode};

/// Which of the five dispatch strategies governs one interface's
/// `synchronize`/`synchronize_nowait` calls (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPolicy {
    MasterDynamic,
    PeerStatic,
    PeerDynamic,
    LocalAsync { k: usize },
    LocalSync,
}

/// Selects the dispatch policy from the resolved evaluation layout and the
/// local concurrency knob, per the table in §4.6. `layout` is `None` when
/// there are no evaluation servers at all (pure local execution).
pub fn select_dispatch_policy(layout: Option<&ServerLayout>, local_concurrency: usize) -> DispatchPolicy {
    match layout {
        None => {
            if local_concurrency > 1 {
                DispatchPolicy::LocalAsync { k: local_concurrency }
            } else {
                DispatchPolicy::LocalSync
            }
        }
        Some(layout) if layout.dedicated_master => DispatchPolicy::MasterDynamic,
        Some(layout) => match layout.resolved_scheduling {
            SchedulingMode::PeerDynamic => DispatchPolicy::PeerDynamic,
            _ => DispatchPolicy::PeerStatic,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eval_partition::ServerLayout;

    fn layout(dedicated_master: bool, scheduling: SchedulingMode) -> ServerLayout {
        ServerLayout {
            num_servers: 3,
            procs_per_server: 1,
            dedicated_master,
            partial_server_procs: None,
            resolved_scheduling: scheduling,
        }
    }

    #[test]
    fn dedicated_master_layout_selects_master_dynamic() {
        let l = layout(true, SchedulingMode::DedicatedMaster);
        assert_eq!(select_dispatch_policy(Some(&l), 1), DispatchPolicy::MasterDynamic);
    }

    #[test]
    fn peer_layout_with_dynamic_scheduling_selects_peer_dynamic() {
        let l = layout(false, SchedulingMode::PeerDynamic);
        assert_eq!(select_dispatch_policy(Some(&l), 1), DispatchPolicy::PeerDynamic);
    }

    #[test]
    fn peer_layout_with_static_scheduling_selects_peer_static() {
        let l = layout(false, SchedulingMode::PeerStatic);
        assert_eq!(select_dispatch_policy(Some(&l), 1), DispatchPolicy::PeerStatic);
    }

    #[test]
    fn no_layout_with_concurrency_selects_local_async() {
        assert_eq!(select_dispatch_policy(None, 4), DispatchPolicy::LocalAsync { k: 4 });
    }

    #[test]
    fn no_layout_no_concurrency_selects_local_sync() {
        assert_eq!(select_dispatch_policy(None, 1), DispatchPolicy::LocalSync);
    }
}
