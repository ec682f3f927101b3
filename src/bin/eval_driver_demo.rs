//! Minimal end-to-end run of the evaluation scheduler: a two-variable
//! Rosenbrock simulator dispatched through `eval-interface`'s local-async
//! policy, with the cache and restart journal both enabled.

use std::sync::Arc;

use eval_cache::EvaluationCache;
use eval_interface::{DriverConfig, EvalInterface};
use eval_scheduler::LocalSimulator;
use eval_types::{ActiveSet, Pair, Response, ResponseData, Variables};
use restart_journal::RestartJournal;

fn rosenbrock_simulator() -> Arc<dyn LocalSimulator> {
    Arc::new(|pair: &Pair| {
        let x = pair.vars.continuous[0];
        let y = pair.vars.continuous[1];
        async move {
            let value = (1.0 - x).powi(2) + 100.0 * (y - x * x).powi(2);
            Ok(ResponseData::new(vec![value], vec![], vec![]))
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let journal_path = std::env::temp_dir().join("eval-driver-demo-restart.dat");
    let journal = Arc::new(RestartJournal::create(&journal_path).await?);
    let cache = Arc::new(EvaluationCache::new());

    let mut config = DriverConfig::default();
    config.async_local_eval_concurrency = 4;

    let mut interface = EvalInterface::new(
        "rosenbrock2d",
        2,
        1,
        config,
        rosenbrock_simulator(),
        None,
        Some(cache),
        Some(journal),
    );
    interface.init_communicators(1, [16, 32, 128, 176], 4)?;

    let points = [[0.0, 0.0], [1.0, 1.0], [-1.0, 1.0], [2.0, -1.0], [1.0, 1.0]];
    let mut responses = Vec::new();
    for point in points {
        let active_set = ActiveSet::values_only(1);
        let response = Response::new_owning(active_set.clone(), ResponseData::default());
        let vars = Variables::new(point.to_vec(), vec![], vec![]);
        let eval_id = interface.map(vars, active_set, &response, true).await?;
        responses.push((eval_id, response));
    }

    interface.synchronize().await?;

    for (eval_id, response) in &responses {
        tracing::info!(eval_id, value = response.get().values[0], "evaluation complete");
    }

    interface.stop_evaluation_servers().await?;
    Ok(())
}
