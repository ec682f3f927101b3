use std::future::Future;
use std::pin::Pin;

use eval_types::Pair;

use crate::local::SimOutcome;

/// In-process evaluation, used by the local-sync/local-async dispatch
/// policies and by peer-dynamic's local rank-0 slot. The async boundary
/// mirrors the source's `derived_map`/`derived_map_async` simulator calls
/// (§6 "Simulator boundary").
pub trait LocalSimulator: Send + Sync {
    fn invoke(&self, pair: &Pair) -> Pin<Box<dyn Future<Output = SimOutcome> + Send>>;
}

impl<F, Fut> LocalSimulator for F
where
    F: Fn(&Pair) -> Fut + Send + Sync,
    Fut: Future<Output = SimOutcome> + Send + 'static,
{
    fn invoke(&self, pair: &Pair) -> Pin<Box<dyn Future<Output = SimOutcome> + Send>> {
        Box::pin((self)(pair))
    }
}
