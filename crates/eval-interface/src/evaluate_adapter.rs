use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use eval_failure::{Evaluate, SimOutcome};
use eval_scheduler::LocalSimulator;
use eval_types::{ActiveSet, Pair, Response, ResponseData, Variables};

/// Adapts the façade's `LocalSimulator` (keyed by a whole [`Pair`]) to the
/// narrower [`Evaluate`] trait the failure manager re-invokes retry and
/// continuation candidates through. The synthetic `eval_id` (0) never
/// reaches the cache or journal — retries and continuation probes are not
/// independently addressable evaluations.
pub struct SimulatorEvaluateAdapter {
    pub simulator: Arc<dyn LocalSimulator>,
    pub interface_id: String,
}

impl Evaluate for SimulatorEvaluateAdapter {
    fn evaluate(
        &self,
        vars: &Variables,
        active_set: &ActiveSet,
    ) -> Pin<Box<dyn Future<Output = SimOutcome> + Send>> {
        let response = Response::new_owning(active_set.clone(), ResponseData::default());
        let pair = Pair::new(0, self.interface_id.clone(), vars.clone(), active_set.clone(), response);
        let simulator = self.simulator.clone();
        Box::pin(async move { simulator.invoke(&pair).await })
    }
}
