use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use eval_types::{EvalId, ResponseData, SimFailure};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};

pub type SimOutcome = Result<ResponseData, SimFailure>;
type TaggedFuture = Pin<Box<dyn Future<Output = (EvalId, SimOutcome)> + Send>>;

/// Which local-async slot-assignment rule governs one executor (§4.6
/// "Asynchronous local concurrency K"). `Dynamic` hands a vacated slot to
/// whichever queued eval_id is next; `Static` constrains eval_id `e` to
/// slot `e mod K`, so replaying the same eval_id stream always lands each
/// eval_id in the same slot regardless of completion timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalAsyncMode {
    #[default]
    Dynamic,
    Static,
}

/// Drives up to `k` local jobs concurrently, standing in for message
/// passing when the interface has no evaluation servers (§4.6
/// "Asynchronous local concurrency K"). `K == 1` degenerates to strictly
/// sequential execution, matching local-sync observable behavior, under
/// either mode.
pub enum LocalExecutor {
    Dynamic(DynamicExecutor),
    Static(StaticExecutor),
}

impl LocalExecutor {
    pub fn new(k: usize) -> Self {
        Self::with_mode(k, LocalAsyncMode::Dynamic)
    }

    pub fn with_mode(k: usize, mode: LocalAsyncMode) -> Self {
        match mode {
            LocalAsyncMode::Dynamic => LocalExecutor::Dynamic(DynamicExecutor::new(k)),
            LocalAsyncMode::Static => LocalExecutor::Static(StaticExecutor::new(k)),
        }
    }

    pub fn capacity(&self) -> usize {
        match self {
            LocalExecutor::Dynamic(e) => e.capacity(),
            LocalExecutor::Static(e) => e.capacity(),
        }
    }

    pub fn in_flight(&self) -> usize {
        match self {
            LocalExecutor::Dynamic(e) => e.in_flight(),
            LocalExecutor::Static(e) => e.in_flight(),
        }
    }

    pub fn has_room(&self) -> bool {
        match self {
            LocalExecutor::Dynamic(e) => e.has_room(),
            LocalExecutor::Static(e) => e.has_room(),
        }
    }

    /// Whether `eval_id` can be launched right now. Dynamic mode only cares
    /// that some slot is free; static mode requires `eval_id`'s own
    /// deterministic slot (`eval_id mod K`) to be free.
    pub fn can_launch(&self, eval_id: EvalId) -> bool {
        match self {
            LocalExecutor::Dynamic(e) => e.has_room(),
            LocalExecutor::Static(e) => e.slot_free_for(eval_id),
        }
    }

    pub fn launch<F>(&mut self, eval_id: EvalId, job: F)
    where
        F: Future<Output = SimOutcome> + Send + 'static,
    {
        match self {
            LocalExecutor::Dynamic(e) => e.launch(eval_id, job),
            LocalExecutor::Static(e) => e.launch(eval_id, job),
        }
    }

    /// Blocks until at least one job completes, then drains any others
    /// already ready. Dynamic mode reports them in completion order; static
    /// mode reports them in slot order for deterministic replay.
    pub async fn wait_and_drain(&mut self) -> Vec<(EvalId, SimOutcome)> {
        match self {
            LocalExecutor::Dynamic(e) => e.wait_and_drain().await,
            LocalExecutor::Static(e) => e.wait_and_drain().await,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            LocalExecutor::Dynamic(e) => e.is_empty(),
            LocalExecutor::Static(e) => e.is_empty(),
        }
    }

    /// Non-blocking: returns one completed job if any is already ready,
    /// without suspending when none is.
    pub fn try_recv_one(&mut self) -> Option<(EvalId, SimOutcome)> {
        match self {
            LocalExecutor::Dynamic(e) => e.try_recv_one(),
            LocalExecutor::Static(e) => e.try_drain_ready().into_iter().next(),
        }
    }
}

/// Any-free-slot variant: jobs are handed to whichever slot frees up next,
/// so completion (and therefore harvest) order tracks wall-clock timing
/// rather than eval_id.
pub struct DynamicExecutor {
    k: usize,
    active: FuturesUnordered<TaggedFuture>,
}

impl DynamicExecutor {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            active: FuturesUnordered::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.k
    }

    pub fn in_flight(&self) -> usize {
        self.active.len()
    }

    pub fn has_room(&self) -> bool {
        self.active.len() < self.k
    }

    pub fn launch<F>(&mut self, eval_id: EvalId, job: F)
    where
        F: Future<Output = SimOutcome> + Send + 'static,
    {
        self.active.push(Box::pin(async move { (eval_id, job.await) }));
    }

    /// Blocks until at least one job completes, then drains any others that
    /// are already ready without waiting further.
    pub async fn wait_and_drain(&mut self) -> Vec<(EvalId, SimOutcome)> {
        let mut out = Vec::new();
        if let Some(first) = self.active.next().await {
            out.push(first);
        }
        while let Some(Some(item)) = self.active.next().now_or_never() {
            out.push(item);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Non-blocking: returns one completed job if any is already ready,
    /// without suspending when none is.
    pub fn try_recv_one(&mut self) -> Option<(EvalId, SimOutcome)> {
        self.active.next().now_or_never().flatten()
    }
}

fn poll_all_ready(slots: &mut [Option<TaggedFuture>], cx: &mut Context<'_>) -> Vec<(EvalId, SimOutcome)> {
    let mut out = Vec::new();
    for slot in slots.iter_mut() {
        if let Some(fut) = slot {
            if let Poll::Ready(result) = fut.as_mut().poll(cx) {
                out.push(result);
                *slot = None;
            }
        }
    }
    out
}

/// Fixed-slot variant: eval_id `e` is pinned to slot `e mod K`. Harvesting
/// always scans slots 0..K in order, so the same eval_id stream replayed
/// twice produces the same completion order regardless of how long each
/// job actually takes (§4.6).
pub struct StaticExecutor {
    k: usize,
    slots: Vec<Option<TaggedFuture>>,
}

impl StaticExecutor {
    pub fn new(k: usize) -> Self {
        let k = k.max(1);
        Self {
            k,
            slots: (0..k).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.k
    }

    pub fn in_flight(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn has_room(&self) -> bool {
        self.slots.iter().any(|s| s.is_none())
    }

    pub fn slot_for(&self, eval_id: EvalId) -> usize {
        eval_id.rem_euclid(self.k as i32) as usize
    }

    pub fn slot_free_for(&self, eval_id: EvalId) -> bool {
        self.slots[self.slot_for(eval_id)].is_none()
    }

    pub fn launch<F>(&mut self, eval_id: EvalId, job: F)
    where
        F: Future<Output = SimOutcome> + Send + 'static,
    {
        let slot = self.slot_for(eval_id);
        debug_assert!(self.slots[slot].is_none(), "slot {slot} already occupied by another eval_id");
        self.slots[slot] = Some(Box::pin(async move { (eval_id, job.await) }));
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// Blocks until at least one slot completes, then reports every slot
    /// that is ready by then, scanned in slot order.
    pub async fn wait_and_drain(&mut self) -> Vec<(EvalId, SimOutcome)> {
        std::future::poll_fn(|cx| {
            let ready = poll_all_ready(&mut self.slots, cx);
            if ready.is_empty() {
                Poll::Pending
            } else {
                Poll::Ready(ready)
            }
        })
        .await
    }

    /// Non-blocking: returns every slot that is already ready, in slot
    /// order, without suspending.
    pub fn try_drain_ready(&mut self) -> Vec<(EvalId, SimOutcome)> {
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        poll_all_ready(&mut self.slots, &mut cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn k_one_runs_strictly_one_at_a_time() {
        let mut exec = LocalExecutor::new(1);
        assert!(exec.has_room());
        exec.launch(1, async { Ok(ResponseData::new(vec![1.0], vec![], vec![])) });
        assert!(!exec.has_room());
        let done = exec.wait_and_drain().await;
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].0, 1);
    }

    #[tokio::test]
    async fn failure_is_returned_not_panicked() {
        let mut exec = LocalExecutor::new(2);
        exec.launch(5, async { Err(SimFailure::new(7)) });
        let done = exec.wait_and_drain().await;
        assert_eq!(done[0].0, 5);
        assert_eq!(done[0].1, Err(SimFailure::new(7)));
    }

    #[tokio::test]
    async fn static_mode_assigns_eval_id_mod_k_to_its_slot() {
        let mut exec = StaticExecutor::new(3);
        assert_eq!(exec.slot_for(0), 0);
        assert_eq!(exec.slot_for(4), 1);
        assert_eq!(exec.slot_for(5), 2);
        assert!(exec.slot_free_for(4));
        exec.launch(4, async { Ok(ResponseData::new(vec![4.0], vec![], vec![])) });
        assert!(!exec.slot_free_for(1));
        assert!(exec.slot_free_for(5));
    }

    #[tokio::test]
    async fn static_mode_harvests_in_slot_order_not_launch_order() {
        let mut exec = LocalExecutor::with_mode(3, LocalAsyncMode::Static);
        // eval_id 5 -> slot 2, eval_id 3 -> slot 0, launched in that order;
        // both resolve immediately, so harvest order is determined purely
        // by slot index, not by the order launch() was called.
        exec.launch(5, async { Ok(ResponseData::new(vec![5.0], vec![], vec![])) });
        exec.launch(3, async { Ok(ResponseData::new(vec![3.0], vec![], vec![])) });
        let done = exec.wait_and_drain().await;
        let ids: Vec<EvalId> = done.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![3, 5]);
    }
}
