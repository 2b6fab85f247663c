//! Execution trace and result types.
//!
//! Every run records an append-only list of [`ExecutionEvent`]s. Each event is
//! also emitted through `tracing` so hosts that only watch logs see the same
//! story.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
  #[serde(rename = "node:enter")]
  NodeEnter,
  #[serde(rename = "node:exit")]
  NodeExit,
  #[serde(rename = "log")]
  Log,
  #[serde(rename = "error")]
  Error,
  #[serde(rename = "action")]
  Action,
}

/// One entry of a run's trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionEvent {
  pub ts: DateTime<Utc>,
  #[serde(rename = "type")]
  pub kind: EventKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub node_id: Option<String>,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Termination {
  /// The walk reached a node with no outgoing route.
  Completed,
  /// A Stop node was reached.
  StopNode,
  /// The step or wall-clock limit was hit.
  LimitExceeded,
  /// A node failed.
  Failed,
}

/// Result of a complete workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
  /// Unique execution ID.
  pub execution_id: String,
  pub events: Vec<ExecutionEvent>,
  /// Always true once a run has returned.
  pub stopped: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  pub termination: Termination,
  /// Number of nodes visited.
  pub steps: usize,
}

impl ExecutionResult {
  pub fn is_success(&self) -> bool {
    self.error.is_none()
  }

  /// Events of one kind, in order.
  pub fn events_of(&self, kind: EventKind) -> impl Iterator<Item = &ExecutionEvent> {
    self.events.iter().filter(move |e| e.kind == kind)
  }
}

/// Append-only trace for a single run.
#[derive(Debug)]
pub(crate) struct Trace {
  execution_id: String,
  events: Vec<ExecutionEvent>,
}

impl Trace {
  pub fn new(execution_id: String) -> Self {
    Self {
      execution_id,
      events: Vec::new(),
    }
  }

  pub fn execution_id(&self) -> &str {
    &self.execution_id
  }

  pub fn record(
    &mut self,
    kind: EventKind,
    node_id: Option<&str>,
    message: impl Into<String>,
    data: Option<Value>,
  ) {
    let message = message.into();
    let node = node_id.unwrap_or("-");
    match kind {
      EventKind::NodeEnter => {
        debug!(execution_id = %self.execution_id, node_id = %node, "node_enter")
      }
      EventKind::NodeExit => {
        debug!(execution_id = %self.execution_id, node_id = %node, "node_exit")
      }
      EventKind::Log => {
        info!(execution_id = %self.execution_id, node_id = %node, message = %message, "node_log")
      }
      EventKind::Action => {
        info!(execution_id = %self.execution_id, node_id = %node, message = %message, "node_action")
      }
      EventKind::Error => {
        warn!(execution_id = %self.execution_id, node_id = %node, message = %message, "node_error")
      }
    }

    self.events.push(ExecutionEvent {
      ts: Utc::now(),
      kind,
      node_id: node_id.map(str::to_string),
      message,
      data,
    });
  }

  pub fn into_events(self) -> Vec<ExecutionEvent> {
    self.events
  }
}
