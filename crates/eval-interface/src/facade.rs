use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use eval_cache::EvaluationCache;
use eval_failure::FailureManager;
use eval_partition::{Partition, PartitionConfig};
use eval_scheduler::{select_dispatch_policy, DispatchPolicy, LocalSimulator, Scheduler, Transport};
use eval_types::{ActiveSet, EvalId, Fingerprint, Pair, Response, ResponseData, Variables};
use restart_journal::RestartJournal;
use tracing::debug;

use crate::config::DriverConfig;
use crate::error::InterfaceError;
use crate::evaluate_adapter::SimulatorEvaluateAdapter;
use crate::neighbor_source::CacheNeighborSource;

/// One `(vars, active_set, response-handle)` still owed a result, tracked
/// between `map()` and the next `synchronize`/`synchronize_nowait` so the
/// façade can write the caller's `Response` in place and append to the
/// cache/journal once the outcome lands (§4.9).
struct Pending {
    vars: Variables,
    active_set: ActiveSet,
    response: Response,
}

/// The public façade (C9): composes the cache, restart journal, partition,
/// scheduler, and failure manager behind `map`/`synchronize`/
/// `synchronize_nowait`/`init_communicators`/`set_communicators`/
/// `stop_evaluation_servers` (§4.9, §6).
pub struct EvalInterface {
    interface_id: String,
    num_vars: usize,
    num_responses: usize,
    config: DriverConfig,
    simulator: Arc<dyn LocalSimulator>,
    transport: Option<Arc<dyn Transport>>,
    cache: Option<Arc<EvaluationCache>>,
    journal: Option<Arc<RestartJournal>>,
    failure_manager: FailureManager,
    counter: EvalId,
    partition: Option<Partition>,
    scheduler: Option<Scheduler>,
    pending: HashMap<EvalId, Pending>,
}

impl EvalInterface {
    /// Constructs an uninitialized interface. `init_communicators` must be
    /// called before `map`/`synchronize` — mirrors the source's
    /// iterator-constructs-then-initializes lifecycle (§4.3).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        interface_id: impl Into<String>,
        num_vars: usize,
        num_responses: usize,
        config: DriverConfig,
        simulator: Arc<dyn LocalSimulator>,
        transport: Option<Arc<dyn Transport>>,
        cache: Option<Arc<EvaluationCache>>,
        journal: Option<Arc<RestartJournal>>,
    ) -> Self {
        let failure_manager = FailureManager::new(config.failure_policy.clone());
        Self {
            interface_id: interface_id.into(),
            num_vars,
            num_responses,
            config,
            simulator,
            transport,
            cache,
            journal,
            failure_manager,
            counter: 0,
            partition: None,
            scheduler: None,
            pending: HashMap::new(),
        }
    }

    fn partition_config(&self) -> PartitionConfig {
        PartitionConfig {
            num_eval_servers: self.config.num_eval_servers,
            procs_per_eval_server: self.config.procs_per_eval,
            dedicated_eval_master: matches!(
                self.config.eval_scheduling.0,
                eval_partition::SchedulingMode::DedicatedMaster
            ),
            eval_scheduling: self.config.eval_scheduling,
            num_analysis_servers: self.config.num_analysis_servers,
            procs_per_analysis_server: self.config.procs_per_analysis,
            dedicated_analysis_master: matches!(
                self.config.analysis_scheduling.0,
                eval_partition::SchedulingMode::DedicatedMaster
            ),
            analysis_scheduling: self.config.analysis_scheduling,
        }
    }

    fn build_scheduler(&self, partition: &Partition) -> Scheduler {
        let layout_for_policy = self.transport.as_ref().map(|_| &partition.eval_layout);
        let policy = select_dispatch_policy(layout_for_policy, self.config.async_local_eval_concurrency);

        match policy {
            DispatchPolicy::MasterDynamic => {
                Scheduler::new_master_dynamic(self.transport_arc(), partition.eval_layout.server_ids())
            }
            DispatchPolicy::PeerStatic => {
                Scheduler::new_peer_static(self.transport_arc(), partition.eval_layout.server_ids())
            }
            DispatchPolicy::PeerDynamic => Scheduler::new_peer_dynamic(
                self.transport_arc(),
                partition.eval_layout.server_ids(),
                self.simulator.clone(),
            ),
            DispatchPolicy::LocalAsync { k } => {
                Scheduler::new_local_async_with_mode(self.simulator.clone(), k, self.config.async_local_mode)
            }
            DispatchPolicy::LocalSync => Scheduler::new_local_sync(self.simulator.clone()),
        }
    }

    fn transport_arc(&self) -> Arc<dyn Transport> {
        self.transport.clone().expect("remote dispatch policy requires a transport")
    }

    /// Builds the nested communicator layout and the scheduler it implies
    /// (§4.3, §6). `message_lengths` is `[value, gradient, hessian, pair]`
    /// wire-size estimates from the embedder's `eval-framing::LengthEstimator`.
    pub fn init_communicators(
        &mut self,
        world_size: usize,
        message_lengths: [usize; 4],
        max_iterator_concurrency: usize,
    ) -> Result<(), InterfaceError> {
        let partition = Partition::init_communicators(
            world_size,
            &self.partition_config(),
            max_iterator_concurrency,
            message_lengths,
        )?;
        let scheduler = self.build_scheduler(&partition);
        self.partition = Some(partition);
        self.scheduler = Some(scheduler);
        Ok(())
    }

    /// Re-entry point: never rebuilds the scheduler's communicators, only
    /// refreshes the stored message-length estimate when it actually
    /// changed (§4.3 re-entry rule, supplemented from the original source).
    pub fn set_communicators(
        &mut self,
        message_lengths: [usize; 4],
        max_iterator_concurrency: usize,
    ) -> Result<(), InterfaceError> {
        let partition = self
            .partition
            .as_mut()
            .ok_or_else(|| InterfaceError::Configuration("set_communicators called before init_communicators".into()))?;
        partition.set_communicators(&self.partition_config(), max_iterator_concurrency, message_lengths)?;
        Ok(())
    }

    fn scheduler_mut(&mut self) -> Result<&mut Scheduler, InterfaceError> {
        self.scheduler
            .as_mut()
            .ok_or_else(|| InterfaceError::Configuration("map called before init_communicators".into()))
    }

    /// Submits one evaluation (§4.9). Serves it immediately from the cache
    /// or, for the synchronous path, from the simulator; otherwise enqueues
    /// it (or records it as a duplicate) for the next `synchronize` call.
    pub async fn map(
        &mut self,
        vars: Variables,
        active_set: ActiveSet,
        response: &Response,
        is_async: bool,
    ) -> Result<EvalId, InterfaceError> {
        active_set.validate(self.num_responses, self.num_vars)?;

        self.counter += 1;
        let eval_id = self.counter;
        let fingerprint = Fingerprint::new(self.interface_id.clone(), vars.clone(), active_set.clone());

        if let Some(cache) = self.cache.clone() {
            if let Some(data) = cache.lookup(&fingerprint) {
                response.set(data.clone());
                if is_async {
                    self.scheduler_mut()?.record_history_dup(eval_id, data);
                }
                debug!(eval_id, "map: served from cache, no dispatch");
                return Ok(eval_id);
            }
        }

        if is_async {
            if let Some(source_eval_id) = self.scheduler_mut()?.find_in_flight_eval_id(&fingerprint) {
                self.scheduler_mut()?.record_pending_dup(eval_id, source_eval_id);
                self.pending.insert(eval_id, Pending { vars, active_set, response: response.clone() });
                debug!(eval_id, source_eval_id, "map: recorded as pending-queue duplicate");
                return Ok(eval_id);
            }

            let pair = Pair::new(eval_id, self.interface_id.clone(), vars.clone(), active_set.clone(), response.clone());
            self.scheduler_mut()?.enqueue(pair)?;
            self.pending.insert(eval_id, Pending { vars, active_set, response: response.clone() });
            debug!(eval_id, "map: enqueued for asynchronous dispatch");
            return Ok(eval_id);
        }

        let probe = Response::new_owning(active_set.clone(), ResponseData::default());
        let pair = Pair::new(eval_id, self.interface_id.clone(), vars.clone(), active_set.clone(), probe);
        let outcome = self.simulator.invoke(&pair).await;
        let data = self.resolve_outcome(eval_id, &vars, &active_set, outcome).await?;
        response.set(data.clone());
        self.finalize(eval_id, vars, active_set, data).await?;
        Ok(eval_id)
    }

    async fn resolve_outcome(
        &self,
        eval_id: EvalId,
        vars: &Variables,
        active_set: &ActiveSet,
        outcome: eval_scheduler::SimOutcome,
    ) -> Result<ResponseData, InterfaceError> {
        match outcome {
            Ok(data) => Ok(data),
            Err(cause) => {
                let evaluator = SimulatorEvaluateAdapter {
                    simulator: self.simulator.clone(),
                    interface_id: self.interface_id.clone(),
                };
                let neighbor_source = self.cache.clone().map(|cache| CacheNeighborSource { cache });
                let data = self
                    .failure_manager
                    .handle(
                        eval_id,
                        &self.interface_id,
                        vars,
                        active_set,
                        self.num_vars,
                        cause,
                        &evaluator,
                        neighbor_source.as_ref().map(|n| n as &dyn eval_failure::NearestNeighborSource),
                    )
                    .await?;
                Ok(data)
            }
        }
    }

    /// Inserts the completed pair into the cache and appends it to the
    /// restart journal, in that order (§4.2's ordering contract).
    async fn finalize(
        &self,
        eval_id: EvalId,
        vars: Variables,
        active_set: ActiveSet,
        data: ResponseData,
    ) -> Result<(), InterfaceError> {
        if self.cache.is_some() || self.journal.is_some() {
            let response = Response::new_owning(active_set.clone(), data);
            let pair = Pair::new(eval_id, self.interface_id.clone(), vars, active_set, response);
            if let Some(cache) = &self.cache {
                cache.insert(pair.clone());
            }
            if let Some(journal) = &self.journal {
                journal.append(&pair).await?;
            }
        }
        Ok(())
    }

    async fn deliver(&mut self, outcomes: BTreeMap<EvalId, eval_scheduler::SimOutcome>) -> Result<BTreeMap<EvalId, ResponseData>, InterfaceError> {
        let mut delivered = BTreeMap::new();
        for (eval_id, outcome) in outcomes {
            let Some(Pending { vars, active_set, response }) = self.pending.remove(&eval_id) else {
                continue;
            };
            let data = self.resolve_outcome(eval_id, &vars, &active_set, outcome).await?;
            response.set(data.clone());
            self.finalize(eval_id, vars, active_set, data.clone()).await?;
            delivered.insert(eval_id, data);
        }
        Ok(delivered)
    }

    /// Blocks until every currently-enqueued evaluation has a response
    /// (§4.6 "synchronize()"). Cache-satisfied duplicates are not included
    /// — they were already delivered synchronously inside `map`.
    pub async fn synchronize(&mut self) -> Result<BTreeMap<EvalId, ResponseData>, InterfaceError> {
        let outcomes = self.scheduler_mut()?.synchronize().await?;
        self.deliver(outcomes).await
    }

    /// Delivers whatever is already resolved, leaving the rest queued for a
    /// later call (§4.6 "Non-blocking scheduling").
    pub async fn synchronize_nowait(&mut self) -> Result<BTreeMap<EvalId, ResponseData>, InterfaceError> {
        let outcomes = self.scheduler_mut()?.synchronize_nowait().await?;
        self.deliver(outcomes).await
    }

    /// Broadcasts the termination tag to every evaluation server and frees
    /// the partition (§6). A no-op for purely local dispatch policies.
    pub async fn stop_evaluation_servers(&mut self) -> Result<(), InterfaceError> {
        if let Some(transport) = &self.transport {
            if let Some(partition) = &self.partition {
                let workers: Vec<eval_scheduler::WorkerId> =
                    partition.eval_layout.server_ids().into_iter().map(eval_scheduler::WorkerId::Remote).collect();
                transport
                    .broadcast_termination(&workers)
                    .await
                    .map_err(InterfaceError::from)?;
            }
        }
        if let Some(partition) = &mut self.partition {
            partition.free();
        }
        Ok(())
    }
}
