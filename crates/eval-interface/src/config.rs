use eval_failure::FailurePolicy;
use eval_partition::SchedulingModeConfig;
use eval_scheduler::LocalAsyncMode;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// The knobs an embedder supplies to one [`crate::EvalInterface`] (§6).
/// Deserializable from YAML or JSON; no environment variables are read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    pub num_eval_servers: Option<usize>,
    pub procs_per_eval: Option<usize>,
    pub num_analysis_servers: Option<usize>,
    pub procs_per_analysis: Option<usize>,
    #[serde(default)]
    pub eval_scheduling: SchedulingModeConfig,
    #[serde(default)]
    pub analysis_scheduling: SchedulingModeConfig,
    #[serde(default)]
    pub async_local_eval_concurrency: usize,
    #[serde(default)]
    pub async_local_analysis_concurrency: usize,
    #[serde(default)]
    pub async_local_mode: LocalAsyncMode,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
    #[serde(default)]
    pub restart_file_enabled: bool,
    pub restart_file_path: Option<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            num_eval_servers: None,
            procs_per_eval: None,
            num_analysis_servers: None,
            procs_per_analysis: None,
            eval_scheduling: SchedulingModeConfig::default(),
            analysis_scheduling: SchedulingModeConfig::default(),
            async_local_eval_concurrency: 1,
            async_local_analysis_concurrency: 1,
            async_local_mode: LocalAsyncMode::Dynamic,
            failure_policy: FailurePolicy::default(),
            cache_enabled: true,
            restart_file_enabled: false,
            restart_file_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_round_trip_keeps_defaults_for_omitted_fields() {
        let yaml = "num_eval_servers: 4\nprocs_per_eval: 2\n";
        let config: DriverConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.num_eval_servers, Some(4));
        assert!(config.cache_enabled);
        assert_eq!(config.async_local_eval_concurrency, 0);
    }

    #[test]
    fn json_round_trip_preserves_failure_policy() {
        let json = serde_json::to_string(&DriverConfig {
            failure_policy: FailurePolicy::Retry { max_attempts: 3 },
            ..Default::default()
        })
        .unwrap();
        let config: DriverConfig = serde_json::from_str(&json).unwrap();
        assert!(matches!(config.failure_policy, FailurePolicy::Retry { max_attempts: 3 }));
    }
}
