use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Resource limits for a single workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionLimits {
  /// Maximum number of steps before the run is stopped.
  pub max_nodes: usize,
  /// Wall-clock budget for the whole run, in milliseconds.
  pub max_duration_ms: u64,
  /// Maximum iterations of any single loop node.
  pub max_loop_iterations: usize,
}

impl ExecutionLimits {
  pub const DEFAULT_MAX_NODES: usize = 200;
  pub const DEFAULT_MAX_DURATION_MS: u64 = 5000;
  pub const DEFAULT_MAX_LOOP_ITERATIONS: usize = 50;

  pub fn max_duration(&self) -> Duration {
    Duration::from_millis(self.max_duration_ms)
  }

  /// Apply caller overrides on top of these limits.
  pub fn with_overrides(self, overrides: &LimitOverrides) -> Self {
    Self {
      max_nodes: overrides.max_nodes.unwrap_or(self.max_nodes),
      max_duration_ms: overrides.max_duration_ms.unwrap_or(self.max_duration_ms),
      max_loop_iterations: overrides
        .max_loop_iterations
        .unwrap_or(self.max_loop_iterations),
    }
  }
}

impl Default for ExecutionLimits {
  fn default() -> Self {
    Self {
      max_nodes: Self::DEFAULT_MAX_NODES,
      max_duration_ms: Self::DEFAULT_MAX_DURATION_MS,
      max_loop_iterations: Self::DEFAULT_MAX_LOOP_ITERATIONS,
    }
  }
}

/// Partial limits supplied by a caller. Unset fields keep the base value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LimitOverrides {
  pub max_nodes: Option<usize>,
  pub max_duration_ms: Option<u64>,
  pub max_loop_iterations: Option<usize>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let limits = ExecutionLimits::default();
    assert_eq!(limits.max_nodes, 200);
    assert_eq!(limits.max_duration(), Duration::from_secs(5));
    assert_eq!(limits.max_loop_iterations, 50);
  }

  #[test]
  fn test_partial_overrides() {
    let overrides: LimitOverrides = serde_json::from_str(r#"{ "maxNodes": 10 }"#).unwrap();
    let limits = ExecutionLimits::default().with_overrides(&overrides);
    assert_eq!(limits.max_nodes, 10);
    assert_eq!(limits.max_duration_ms, 5000);
  }
}
