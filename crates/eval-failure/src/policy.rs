use serde::{Deserialize, Serialize};

/// Depth limit shared by the interval-halving continuation algorithm and
/// its sub-failure bisections (§4.8 scenario 4's "depth limit hits 10").
pub const MAX_FAILURES: usize = 10;

/// Per-interface failure policy, matching the enum of §4.8.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Terminate the run with a diagnostic.
    Abort,
    /// Re-invoke the same (V, S) up to `max_attempts` times total
    /// (including the attempt that failed); abort if all fail.
    Retry { max_attempts: usize },
    /// Replace the response with a constant vector; gradients and
    /// Hessians are zeroed.
    Recover { value: Vec<f64> },
    /// Interval-halving from the nearest cached neighbour toward the
    /// failing target, up to [`MAX_FAILURES`] attempts.
    Continuation,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Abort
    }
}
