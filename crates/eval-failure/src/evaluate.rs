use std::future::Future;
use std::pin::Pin;

use eval_types::{ActiveSet, ResponseData, SimFailure, Variables};

pub type SimOutcome = Result<ResponseData, SimFailure>;

/// Re-invocation boundary the failure manager uses for retry and
/// continuation recovery — deliberately narrower than
/// `eval_scheduler::LocalSimulator` (no `Pair`, no eval_id) so this crate
/// never has to depend on the scheduler crate (§9 "Failure as a
/// control-flow value": the manager only needs to call the simulator
/// again, not dispatch it).
pub trait Evaluate: Send + Sync {
    fn evaluate(&self, vars: &Variables, active_set: &ActiveSet) -> Pin<Box<dyn Future<Output = SimOutcome> + Send>>;
}

impl<F, Fut> Evaluate for F
where
    F: Fn(&Variables, &ActiveSet) -> Fut + Send + Sync,
    Fut: Future<Output = SimOutcome> + Send + 'static,
{
    fn evaluate(&self, vars: &Variables, active_set: &ActiveSet) -> Pin<Box<dyn Future<Output = SimOutcome> + Send>> {
        Box::pin((self)(vars, active_set))
    }
}
