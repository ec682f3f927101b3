use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use eval_framing::pack_vars_active_set;
use eval_partition::ServerId;
use eval_queue::{DuplicateMaps, PendingQueue};
use eval_types::{EvalId, Pair, ResponseData};
use tracing::debug;

use crate::error::SchedulerError;
use crate::local::{LocalAsyncMode, LocalExecutor, SimOutcome};
use crate::outcome::decode_outcome;
use crate::policy::DispatchPolicy;
use crate::simulator::LocalSimulator;
use crate::tie_break::{LowestServerId, TieBreakPolicy};
use crate::transport::Transport;
use crate::worker::WorkerId;

/// Drains the pending queue through whichever dispatch policy the layout
/// selected, and implements the blocking/non-blocking façade entry points
/// (§4.6). Owns the pending queue and the duplicate maps, since both are
/// scoped to one interface's synchronize cycle.
pub struct Scheduler {
    queue: PendingQueue,
    dups: DuplicateMaps,
    policy: DispatchPolicy,
    transport: Option<Arc<dyn Transport>>,
    servers: Vec<ServerId>,
    local: Option<LocalExecutor>,
    simulator: Option<Arc<dyn LocalSimulator>>,
    tie_break: Box<dyn TieBreakPolicy>,
    server_load: HashMap<ServerId, usize>,
    running: HashMap<EvalId, WorkerId>,
}

impl Scheduler {
    fn new(policy: DispatchPolicy) -> Self {
        Self {
            queue: PendingQueue::new(),
            dups: DuplicateMaps::new(),
            policy,
            transport: None,
            servers: Vec::new(),
            local: None,
            simulator: None,
            tie_break: Box::new(LowestServerId),
            server_load: HashMap::new(),
            running: HashMap::new(),
        }
    }

    pub fn new_master_dynamic(transport: Arc<dyn Transport>, servers: Vec<ServerId>) -> Self {
        let mut s = Self::new(DispatchPolicy::MasterDynamic);
        s.transport = Some(transport);
        s.servers = servers;
        s
    }

    pub fn new_peer_static(transport: Arc<dyn Transport>, servers: Vec<ServerId>) -> Self {
        let mut s = Self::new(DispatchPolicy::PeerStatic);
        s.transport = Some(transport);
        s.servers = servers;
        s
    }

    pub fn new_peer_dynamic(
        transport: Arc<dyn Transport>,
        servers: Vec<ServerId>,
        local_simulator: Arc<dyn LocalSimulator>,
    ) -> Self {
        let mut s = Self::new(DispatchPolicy::PeerDynamic);
        s.transport = Some(transport);
        s.servers = servers;
        s.local = Some(LocalExecutor::new(1));
        s.simulator = Some(local_simulator);
        s
    }

    pub fn new_local_async(simulator: Arc<dyn LocalSimulator>, k: usize) -> Self {
        Self::new_local_async_with_mode(simulator, k, LocalAsyncMode::Dynamic)
    }

    pub fn new_local_async_with_mode(simulator: Arc<dyn LocalSimulator>, k: usize, mode: LocalAsyncMode) -> Self {
        let mut s = Self::new(DispatchPolicy::LocalAsync { k });
        s.local = Some(LocalExecutor::with_mode(k, mode));
        s.simulator = Some(simulator);
        s
    }

    pub fn new_local_sync(simulator: Arc<dyn LocalSimulator>) -> Self {
        let mut s = Self::new(DispatchPolicy::LocalSync);
        s.local = Some(LocalExecutor::new(1));
        s.simulator = Some(simulator);
        s
    }

    pub fn with_tie_break(mut self, tie_break: Box<dyn TieBreakPolicy>) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn enqueue(&mut self, pair: Pair) -> Result<(), SchedulerError> {
        Ok(self.queue.enqueue(pair)?)
    }

    pub fn record_history_dup(&mut self, eval_id: EvalId, response: ResponseData) {
        self.dups.record_history_dup(eval_id, response);
    }

    pub fn record_pending_dup(&mut self, dependent: EvalId, source_eval_id: EvalId) {
        self.dups.record_pending_dup(dependent, source_eval_id);
    }

    pub fn find_in_flight_eval_id(&self, fingerprint: &eval_types::Fingerprint) -> Option<EvalId> {
        self.queue.find_by_fingerprint(fingerprint)
    }

    fn transport_arc(&self) -> Arc<dyn Transport> {
        self.transport.clone().expect("remote dispatch requires a transport")
    }

    async fn send_to(&self, worker: WorkerId, pair: &Pair) -> Result<(), SchedulerError> {
        send_to_on(&self.transport_arc(), worker, pair).await
    }

    async fn recv_one(&self) -> Result<(WorkerId, EvalId, SimOutcome), SchedulerError> {
        recv_one_on(&self.transport_arc()).await
    }

    /// Blocking drain: returns only once every currently pending evaluation
    /// has a response (§4.6 "synchronize()").
    pub async fn synchronize(&mut self) -> Result<BTreeMap<EvalId, SimOutcome>, SchedulerError> {
        let mut delivered = BTreeMap::new();

        match self.policy {
            DispatchPolicy::LocalSync | DispatchPolicy::LocalAsync { .. } => {
                self.run_local_to_completion(&mut delivered).await?;
            }
            DispatchPolicy::MasterDynamic => {
                self.run_master_dynamic(&mut delivered).await?;
            }
            DispatchPolicy::PeerStatic => {
                self.run_peer_static(&mut delivered).await?;
            }
            DispatchPolicy::PeerDynamic => {
                self.run_peer_dynamic(&mut delivered).await?;
            }
        }

        self.overlay_duplicates(&mut delivered);
        Ok(delivered)
    }

    /// Non-blocking drain: delivers whatever is ready, leaves the rest
    /// queued, and backs-fill vacated slots by minimum in-flight load
    /// (§4.6 "Non-blocking scheduling").
    pub async fn synchronize_nowait(&mut self) -> Result<BTreeMap<EvalId, SimOutcome>, SchedulerError> {
        let mut delivered = BTreeMap::new();

        if let Some(local) = self.local.as_mut() {
            loop {
                let Some(pair) = self
                    .queue
                    .iter_in_order()
                    .find(|p| !self.running.contains_key(&p.eval_id) && local.can_launch(p.eval_id))
                    .cloned()
                else {
                    break;
                };
                self.running.insert(pair.eval_id, WorkerId::Local(0));
                let sim = self.simulator.clone().expect("local policy requires a simulator");
                let job = sim.invoke(&pair);
                local.launch(pair.eval_id, job);
            }
            // Non-blocking: only harvest what's already finished, never await.
            for (eval_id, outcome) in drain_ready(local).await {
                self.running.remove(&eval_id);
                self.queue.dequeue(eval_id).ok();
                delivered.insert(eval_id, outcome);
            }
        }

        if self.transport.is_some() {
            while let Some((worker, envelope)) = self.transport.as_ref().unwrap().try_recv() {
                let eval_id = envelope.tag as EvalId;
                let outcome = decode_outcome(&envelope.payload)?;
                if let Some(WorkerId::Remote(server)) = self.running.remove(&eval_id) {
                    *self.server_load.entry(server).or_insert(1) = self.server_load.get(&server).copied().unwrap_or(1).saturating_sub(1);
                }
                let _ = worker;
                self.queue.dequeue(eval_id).ok();
                delivered.insert(eval_id, outcome);
            }

            // Backfill vacated remote slots, choosing the least-loaded server.
            loop {
                let Some(pair) = self.queue.iter_in_order().find(|p| !self.running.contains_key(&p.eval_id)).cloned() else {
                    break;
                };
                let Some(server) = self.least_loaded_server() else {
                    break;
                };
                self.running.insert(pair.eval_id, WorkerId::Remote(server));
                *self.server_load.entry(server).or_insert(0) += 1;
                self.send_to(WorkerId::Remote(server), &pair).await?;
            }
        }

        self.overlay_duplicates(&mut delivered);
        Ok(delivered)
    }

    fn least_loaded_server(&mut self) -> Option<ServerId> {
        let min_load = self.servers.iter().map(|s| self.server_load.get(s).copied().unwrap_or(0)).min()?;
        let candidates: Vec<ServerId> = self
            .servers
            .iter()
            .copied()
            .filter(|s| self.server_load.get(s).copied().unwrap_or(0) == min_load)
            .collect();
        self.tie_break.pick(&candidates)
    }

    async fn run_local_to_completion(&mut self, delivered: &mut BTreeMap<EvalId, SimOutcome>) -> Result<(), SchedulerError> {
        let local = self.local.as_mut().expect("local policy requires an executor");
        let simulator = self.simulator.clone().expect("local policy requires a simulator");

        loop {
            loop {
                let Some(pair) = self
                    .queue
                    .iter_in_order()
                    .find(|p| !self.running.contains_key(&p.eval_id) && local.can_launch(p.eval_id))
                    .cloned()
                else {
                    break;
                };
                self.running.insert(pair.eval_id, WorkerId::Local(0));
                let job = simulator.invoke(&pair);
                local.launch(pair.eval_id, job);
            }

            if local.is_empty() {
                break;
            }

            for (eval_id, outcome) in local.wait_and_drain().await {
                self.running.remove(&eval_id);
                self.queue.dequeue(eval_id).ok();
                delivered.insert(eval_id, outcome);
                debug!(eval_id, "local evaluation completed");
            }
        }
        Ok(())
    }

    /// Two-pass self-scheduling: round-robin one job per server, then
    /// refill whichever server completes next (§4.6 "Master-dynamic protocol").
    async fn run_master_dynamic(&mut self, delivered: &mut BTreeMap<EvalId, SimOutcome>) -> Result<(), SchedulerError> {
        for server in self.servers.clone() {
            let Some(pair) = self.queue.iter_in_order().find(|p| !self.running.contains_key(&p.eval_id)).cloned() else {
                break;
            };
            self.running.insert(pair.eval_id, WorkerId::Remote(server));
            self.send_to(WorkerId::Remote(server), &pair).await?;
        }

        while !self.running.is_empty() {
            let (worker, eval_id, outcome) = self.recv_one().await?;
            self.running.remove(&eval_id);
            self.queue.dequeue(eval_id).ok();
            delivered.insert(eval_id, outcome);

            if let WorkerId::Remote(server) = worker {
                if let Some(pair) = self.queue.iter_in_order().find(|p| !self.running.contains_key(&p.eval_id)).cloned() {
                    self.running.insert(pair.eval_id, WorkerId::Remote(server));
                    self.send_to(WorkerId::Remote(server), &pair).await?;
                }
            }
        }
        Ok(())
    }

    /// Peer 0 keeps ⌊N/S⌋ jobs; the remainder is round-robined to peers
    /// 1..S-1. All sends are posted before any receive wait; responses are
    /// presented back in eval_id order (§4.6 "Peer-static protocol").
    async fn run_peer_static(&mut self, delivered: &mut BTreeMap<EvalId, SimOutcome>) -> Result<(), SchedulerError> {
        let ids: Vec<EvalId> = self.queue.eval_ids_in_order().to_vec();
        let pairs: Vec<Pair> = ids.iter().filter_map(|id| self.queue.find_by_eval_id(*id).cloned()).collect();
        let s = self.servers.len().max(1);
        let n = pairs.len();
        let share0 = n / s;

        let (head, remainder) = pairs.split_at(share0.min(n));
        let peer0 = self.servers.first().copied();

        if let Some(peer0) = peer0 {
            for pair in head {
                self.running.insert(pair.eval_id, WorkerId::Remote(peer0));
                self.send_to(WorkerId::Remote(peer0), pair).await?;
            }
        }

        if s > 1 {
            for (i, pair) in remainder.iter().enumerate() {
                let peer = self.servers[1 + i % (s - 1)];
                self.running.insert(pair.eval_id, WorkerId::Remote(peer));
                self.send_to(WorkerId::Remote(peer), pair).await?;
            }
        }

        while !self.running.is_empty() {
            let (_, eval_id, outcome) = self.recv_one().await?;
            self.running.remove(&eval_id);
            self.queue.dequeue(eval_id).ok();
            delivered.insert(eval_id, outcome);
        }
        Ok(())
    }

    /// Like master-dynamic, but the iterator rank also runs jobs locally
    /// in its own slot, interleaved with remote dispatch (§4.6).
    async fn run_peer_dynamic(&mut self, delivered: &mut BTreeMap<EvalId, SimOutcome>) -> Result<(), SchedulerError> {
        let simulator = self.simulator.clone().expect("peer-dynamic requires a local simulator for rank 0");
        let transport = self.transport_arc();
        let mut local = self.local.take().expect("peer-dynamic requires a local executor for rank 0");

        for server in self.servers.clone() {
            let Some(pair) = self.queue.iter_in_order().find(|p| !self.running.contains_key(&p.eval_id)).cloned() else {
                break;
            };
            self.running.insert(pair.eval_id, WorkerId::Remote(server));
            send_to_on(&transport, WorkerId::Remote(server), &pair).await?;
        }

        if local.has_room() {
            if let Some(pair) = self.queue.iter_in_order().find(|p| !self.running.contains_key(&p.eval_id)).cloned() {
                self.running.insert(pair.eval_id, WorkerId::Local(0));
                local.launch(pair.eval_id, simulator.invoke(&pair));
            }
        }

        while !self.running.is_empty() {
            let remote_outstanding = self.running.values().any(|w| matches!(w, WorkerId::Remote(_)));

            if !local.is_empty() && remote_outstanding {
                tokio::select! {
                    remote = recv_one_on(&transport) => {
                        let (worker, eval_id, outcome) = remote?;
                        self.running.remove(&eval_id);
                        self.queue.dequeue(eval_id).ok();
                        delivered.insert(eval_id, outcome);
                        if let WorkerId::Remote(server) = worker {
                            if let Some(pair) = self.queue.iter_in_order().find(|p| !self.running.contains_key(&p.eval_id)).cloned() {
                                self.running.insert(pair.eval_id, WorkerId::Remote(server));
                                send_to_on(&transport, WorkerId::Remote(server), &pair).await?;
                            }
                        }
                    }
                    local_done = local.wait_and_drain() => {
                        for (eval_id, outcome) in local_done {
                            self.running.remove(&eval_id);
                            self.queue.dequeue(eval_id).ok();
                            delivered.insert(eval_id, outcome);
                        }
                        if let Some(pair) = self.queue.iter_in_order().find(|p| !self.running.contains_key(&p.eval_id)).cloned() {
                            self.running.insert(pair.eval_id, WorkerId::Local(0));
                            local.launch(pair.eval_id, simulator.invoke(&pair));
                        }
                    }
                }
            } else if !local.is_empty() {
                for (eval_id, outcome) in local.wait_and_drain().await {
                    self.running.remove(&eval_id);
                    self.queue.dequeue(eval_id).ok();
                    delivered.insert(eval_id, outcome);
                }
                if let Some(pair) = self.queue.iter_in_order().find(|p| !self.running.contains_key(&p.eval_id)).cloned() {
                    self.running.insert(pair.eval_id, WorkerId::Local(0));
                    local.launch(pair.eval_id, simulator.invoke(&pair));
                }
            } else {
                let (worker, eval_id, outcome) = recv_one_on(&transport).await?;
                self.running.remove(&eval_id);
                self.queue.dequeue(eval_id).ok();
                delivered.insert(eval_id, outcome);
                if let WorkerId::Remote(server) = worker {
                    if let Some(pair) = self.queue.iter_in_order().find(|p| !self.running.contains_key(&p.eval_id)).cloned() {
                        self.running.insert(pair.eval_id, WorkerId::Remote(server));
                        send_to_on(&transport, WorkerId::Remote(server), &pair).await?;
                    }
                }
            }
        }

        self.local = Some(local);
        Ok(())
    }

    fn overlay_duplicates(&mut self, delivered: &mut BTreeMap<EvalId, SimOutcome>) {
        let resolved_sources: Vec<EvalId> = delivered.keys().copied().collect();
        for source in resolved_sources {
            if let Some(Ok(response)) = delivered.get(&source) {
                let response = response.clone();
                for dependent in self.dups.resolve_pending_dups_for(source, &response) {
                    if let Some(r) = self.dups.take_resolved_pending_dup(dependent) {
                        delivered.insert(dependent, Ok(r));
                    }
                }
            }
        }
    }
}

async fn send_to_on(transport: &Arc<dyn Transport>, worker: WorkerId, pair: &Pair) -> Result<(), SchedulerError> {
    let bytes = pack_vars_active_set(pair.eval_id as u32, &pair.vars, &pair.active_set)
        .map_err(|e| SchedulerError::Transport(e.to_string()))?;
    transport.send(worker, eval_framing::Envelope::new(pair.eval_id as u32, bytes)).await
}

async fn recv_one_on(transport: &Arc<dyn Transport>) -> Result<(WorkerId, EvalId, SimOutcome), SchedulerError> {
    let (worker, envelope) = transport.wait_any().await?;
    let outcome = decode_outcome(&envelope.payload)?;
    Ok((worker, envelope.tag as EvalId, outcome))
}

async fn drain_ready(local: &mut LocalExecutor) -> Vec<(EvalId, SimOutcome)> {
    let mut out = Vec::new();
    while let Some(item) = local.try_recv_one() {
        out.push(item);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::encode_outcome;
    use crate::transport::ChannelTransport;
    use eval_framing::unpack_vars_active_set;
    use eval_types::{ActiveSet, Response, ResponseData, Variables};
    use std::sync::Arc as StdArc;
    use tokio::sync::mpsc;

    fn pair(eval_id: EvalId, x: f64) -> Pair {
        let vars = Variables::new(vec![x], vec![], vec![]);
        let active_set = ActiveSet::values_only(1);
        let response = Response::new_owning(active_set.clone(), ResponseData::default());
        Pair::new(eval_id, "rosenbrock", vars, active_set, response)
    }

    fn square_simulator() -> StdArc<dyn LocalSimulator> {
        StdArc::new(|pair: &Pair| {
            let x = pair.vars.continuous[0];
            async move { Ok(ResponseData::new(vec![x * x], vec![], vec![])) }
        })
    }

    #[tokio::test]
    async fn local_sync_runs_one_at_a_time_in_order() {
        let mut sched = Scheduler::new_local_sync(square_simulator());
        sched.enqueue(pair(1, 2.0)).unwrap();
        sched.enqueue(pair(2, 3.0)).unwrap();

        let delivered = sched.synchronize().await.unwrap();
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[&1].as_ref().unwrap().values, vec![4.0]);
        assert_eq!(delivered[&2].as_ref().unwrap().values, vec![9.0]);
        assert_eq!(sched.queue_len(), 0);
    }

    #[tokio::test]
    async fn local_async_runs_up_to_k_concurrently() {
        let mut sched = Scheduler::new_local_async(square_simulator(), 2);
        for id in 1..=4 {
            sched.enqueue(pair(id, id as f64)).unwrap();
        }

        let delivered = sched.synchronize().await.unwrap();
        assert_eq!(delivered.len(), 4);
        for id in 1..=4 {
            assert_eq!(delivered[&id].as_ref().unwrap().values, vec![(id * id) as f64]);
        }
    }

    /// Spawns a fake server task that answers every request on `rx` with
    /// `x^2`, replying through `reply_tx`, until it sees a termination tag.
    fn spawn_fake_server(
        worker: WorkerId,
        mut rx: mpsc::UnboundedReceiver<eval_framing::Envelope>,
        reply_tx: mpsc::UnboundedSender<(WorkerId, eval_framing::Envelope)>,
    ) {
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                if envelope.is_termination() {
                    break;
                }
                let (tag, vars, _set, _) = unpack_vars_active_set(&envelope.payload).unwrap();
                let outcome: SimOutcome = Ok(ResponseData::new(vec![vars.continuous[0] * vars.continuous[0]], vec![], vec![]));
                let bytes = encode_outcome(tag, &outcome);
                reply_tx.send((worker, eval_framing::Envelope::new(tag, bytes))).ok();
            }
        });
    }

    #[tokio::test]
    async fn master_dynamic_refills_completed_servers() {
        let mut transport = ChannelTransport::new();
        let servers = vec![ServerId(1), ServerId(2)];
        for &s in &servers {
            let worker = WorkerId::Remote(s);
            let (rx, reply_tx) = transport.register_worker(worker);
            spawn_fake_server(worker, rx, reply_tx);
        }

        let mut sched = Scheduler::new_master_dynamic(StdArc::new(transport), servers);
        for id in 1..=5 {
            sched.enqueue(pair(id, id as f64)).unwrap();
        }

        let delivered = sched.synchronize().await.unwrap();
        assert_eq!(delivered.len(), 5);
        for id in 1..=5 {
            assert_eq!(delivered[&id].as_ref().unwrap().values, vec![(id * id) as f64]);
        }
    }

    #[tokio::test]
    async fn peer_static_splits_by_fixed_share_with_remainder_round_robin() {
        let mut transport = ChannelTransport::new();
        let servers = vec![ServerId(0), ServerId(1), ServerId(2)];
        for &s in &servers {
            let worker = WorkerId::Remote(s);
            let (rx, reply_tx) = transport.register_worker(worker);
            spawn_fake_server(worker, rx, reply_tx);
        }

        let mut sched = Scheduler::new_peer_static(StdArc::new(transport), servers);
        for id in 1..=7 {
            sched.enqueue(pair(id, id as f64)).unwrap();
        }

        let delivered = sched.synchronize().await.unwrap();
        assert_eq!(delivered.len(), 7);
        for id in 1..=7 {
            assert_eq!(delivered[&id].as_ref().unwrap().values, vec![(id * id) as f64]);
        }
    }
}
