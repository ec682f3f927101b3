use eval_types::{ActiveSet, EvalId, ResponseData, SimFailure, Variables};
use tracing::warn;

use crate::error::FailureError;
use crate::evaluate::{Evaluate, SimOutcome};
use crate::neighbor::NearestNeighborSource;
use crate::policy::{FailurePolicy, MAX_FAILURES};

/// Applies a per-interface [`FailurePolicy`] to one simulator failure
/// (§4.8). Retry state lives entirely on the call stack of [`handle`], so
/// it cannot leak between evaluations sharing an async slot.
#[derive(Debug, Clone)]
pub struct FailureManager {
    policy: FailurePolicy,
}

impl FailureManager {
    pub fn new(policy: FailurePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FailurePolicy {
        &self.policy
    }

    /// `vars`/`active_set` are the failing evaluation's request; `cause`
    /// is the failure the first simulator attempt raised. `evaluate` is
    /// used to re-invoke the simulator for retry and continuation;
    /// `neighbors` is required only for [`FailurePolicy::Continuation`].
    pub async fn handle(
        &self,
        eval_id: EvalId,
        interface_id: &str,
        vars: &Variables,
        active_set: &ActiveSet,
        num_vars: usize,
        cause: SimFailure,
        evaluate: &dyn Evaluate,
        neighbors: Option<&dyn NearestNeighborSource>,
    ) -> Result<ResponseData, FailureError> {
        warn!(eval_id, %cause, policy = ?self.policy, "simulator failure captured");

        match &self.policy {
            FailurePolicy::Abort => {
                warn!(eval_id, "failure policy action: abort");
                Err(FailureError::Aborted { eval_id, cause })
            }
            FailurePolicy::Retry { max_attempts } => {
                let result = self.retry(eval_id, vars, active_set, *max_attempts, evaluate).await;
                match &result {
                    Ok(_) => warn!(eval_id, "failure policy action: retry succeeded"),
                    Err(_) => warn!(eval_id, "failure policy action: retry exhausted, aborting"),
                }
                result
            }
            FailurePolicy::Recover { value } => {
                warn!(eval_id, "failure policy action: recover with constant response");
                self.recover(eval_id, value, active_set, num_vars)
            }
            FailurePolicy::Continuation => {
                let Some(neighbors) = neighbors else {
                    return Err(FailureError::NoNeighbour { eval_id });
                };
                let result = self
                    .continuation(eval_id, interface_id, vars, active_set, evaluate, neighbors)
                    .await;
                match &result {
                    Ok(_) => warn!(eval_id, "failure policy action: continuation recovered target"),
                    Err(_) => warn!(eval_id, "failure policy action: continuation exhausted, aborting"),
                }
                result
            }
        }
    }

    /// Re-invokes the same `(V, S)` up to `max_attempts` times total,
    /// counting the already-failed first attempt (§4.8 scenario 3).
    async fn retry(
        &self,
        eval_id: EvalId,
        vars: &Variables,
        active_set: &ActiveSet,
        max_attempts: usize,
        evaluate: &dyn Evaluate,
    ) -> Result<ResponseData, FailureError> {
        let mut attempts = 1;
        while attempts < max_attempts.max(1) {
            attempts += 1;
            warn!(eval_id, attempts, "failure captured: retry attempt number {attempts}");
            match evaluate.evaluate(vars, active_set).await {
                Ok(data) => return Ok(data),
                Err(_) => continue,
            }
        }
        Err(FailureError::RetryExhausted { eval_id, attempts })
    }

    /// Replaces the response with a constant vector; gradients and
    /// Hessians are zeroed (§4.8 `recover(v̄)`).
    fn recover(&self, eval_id: EvalId, value: &[f64], active_set: &ActiveSet, num_vars: usize) -> Result<ResponseData, FailureError> {
        let num_responses = active_set.request_codes.len();
        if value.len() != num_responses {
            return Err(FailureError::InvalidRecoveryVector {
                eval_id,
                source: eval_types::TypesError::RecoveryVectorLengthMismatch {
                    expected: num_responses,
                    actual: value.len(),
                },
            });
        }
        let mut data = ResponseData::zeroed(num_responses, num_vars, active_set);
        data.values = value.to_vec();
        Ok(data)
    }

    /// Interval-halving recovery: builds a sequence of intermediate `V`s
    /// from the nearest cached neighbour toward the failing target,
    /// bisecting further on sub-failures, up to [`MAX_FAILURES`] total
    /// attempts. The final attempt always targets the real `V` exactly
    /// (§4.8 `continuation`, scenario 4).
    async fn continuation(
        &self,
        eval_id: EvalId,
        interface_id: &str,
        target: &Variables,
        active_set: &ActiveSet,
        evaluate: &dyn Evaluate,
        neighbors: &dyn NearestNeighborSource,
    ) -> Result<ResponseData, FailureError> {
        let Some((source, _source_response)) = neighbors.nearest(interface_id, target) else {
            return Err(FailureError::NoNeighbour { eval_id });
        };

        let mut known_good_fraction = 0.0_f64;
        let mut pending_fraction = 0.5_f64;
        let mut attempts = 0usize;

        loop {
            attempts += 1;
            if attempts > MAX_FAILURES {
                return Err(FailureError::ContinuationExhausted { eval_id, attempts: attempts - 1 });
            }

            let at_target = attempts == MAX_FAILURES || (1.0 - pending_fraction).abs() < 1e-12;
            let candidate = if at_target {
                target.clone()
            } else {
                source.interpolate(target, pending_fraction)
            };

            warn!(eval_id, attempts, fraction = pending_fraction, "continuation: evaluating intermediate point");

            match evaluate.evaluate(&candidate, active_set).await {
                Ok(data) if at_target => return Ok(data),
                Ok(_) => {
                    known_good_fraction = pending_fraction;
                    pending_fraction = known_good_fraction + (1.0 - known_good_fraction) / 2.0;
                }
                Err(_) => {
                    pending_fraction = (known_good_fraction + pending_fraction) / 2.0;
                }
            }
        }
    }
}
