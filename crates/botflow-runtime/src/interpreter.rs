use std::time::Duration;

use botflow_config::{DEFAULT_HANDLE, ExecutionContext, ExecutionLimits, NodeKind};
use botflow_workflow::{CompiledKind, CompiledNode, EdgeKind, ExecutableWorkflow};
use serde_json::json;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::dispatch::{Flow, dispatch};
use crate::error::RuntimeError;
use crate::events::{EventKind, ExecutionResult, Termination, Trace};
use crate::handlers::ActionHandlers;
use crate::loops::LoopTable;
use crate::store::VariableStore;

/// Mutable bookkeeping of one run.
pub(crate) struct Run {
  pub trace: Trace,
  pub loops: LoopTable,
  pub limits: ExecutionLimits,
  started: Instant,
  steps: usize,
}

impl Run {
  fn new(execution_id: String, limits: ExecutionLimits) -> Self {
    Self {
      trace: Trace::new(execution_id),
      loops: LoopTable::default(),
      limits,
      started: Instant::now(),
      steps: 0,
    }
  }

  /// Wall-clock budget left before the run is stopped.
  pub fn remaining(&self) -> Duration {
    self.limits.max_duration().saturating_sub(self.started.elapsed())
  }

  fn limit_exceeded(&self) -> Option<String> {
    if self.steps >= self.limits.max_nodes {
      return Some(format!(
        "execution exceeded max node limit ({})",
        self.limits.max_nodes
      ));
    }
    if self.started.elapsed() >= self.limits.max_duration() {
      return Some(format!(
        "execution exceeded max duration ({} ms)",
        self.limits.max_duration_ms
      ));
    }
    None
  }
}

/// Run a compiled workflow against one event until it ends.
///
/// The walk is sequential: each node is dispatched and awaited before the
/// next is chosen. Limits are checked before every step. Every way a run can
/// end, including node failures, is reported in the returned result rather
/// than as an error.
#[instrument(
  name = "workflow_execute",
  skip_all,
  fields(start_node_id = %workflow.start_node_id)
)]
pub async fn execute(
  workflow: &ExecutableWorkflow,
  context: &mut ExecutionContext,
  handlers: &dyn ActionHandlers,
  store: &dyn VariableStore,
  limits: ExecutionLimits,
) -> ExecutionResult {
  let execution_id = uuid::Uuid::new_v4().to_string();
  info!(
    execution_id = %execution_id,
    start_node_id = %workflow.start_node_id,
    command_name = %context.command_name,
    max_nodes = limits.max_nodes,
    max_duration_ms = limits.max_duration_ms,
    "workflow_started"
  );

  let mut run = Run::new(execution_id.clone(), limits);
  let mut next = Some((workflow.start_node_id.clone(), EdgeKind::Forward));

  let (termination, failure) = loop {
    let Some((node_id, arrival)) = next.take() else {
      break (Termination::Completed, None);
    };

    if let Some(message) = run.limit_exceeded() {
      run
        .trace
        .record(EventKind::Error, Some(&node_id), message.clone(), None);
      break (Termination::LimitExceeded, Some(message));
    }

    let Some(node) = workflow.node(&node_id) else {
      let message = RuntimeError::NodeNotFound {
        node_id: node_id.clone(),
      }
      .to_string();
      run.trace.record(EventKind::Error, None, message.clone(), None);
      break (Termination::Failed, Some(message));
    };
    run.steps += 1;

    match step(workflow, node, arrival, context, handlers, store, &mut run).await {
      Ok(Flow::Follow(handle)) => {
        next = workflow
          .route(&node.id, &handle)
          .map(|route| (route.target.clone(), route.kind));
      }
      Ok(Flow::Stop) => break (Termination::StopNode, None),
      Err(e) => {
        let message = e.to_string();
        error!(
          execution_id = %execution_id,
          node_id = %node.id,
          node_type = %node.node_type,
          error = %message,
          "node_failed"
        );
        run.trace.record(
          EventKind::Error,
          Some(&node.id),
          message.clone(),
          Some(json!({ "nodeType": node.node_type })),
        );
        break (Termination::Failed, Some(message));
      }
    }
  };

  match (&termination, &failure) {
    (Termination::LimitExceeded, Some(message)) => {
      warn!(execution_id = %execution_id, steps = run.steps, reason = %message, "workflow_limit_exceeded")
    }
    (_, Some(message)) => {
      error!(execution_id = %execution_id, steps = run.steps, error = %message, "workflow_failed")
    }
    _ => {
      info!(execution_id = %execution_id, steps = run.steps, termination = ?termination, "workflow_completed")
    }
  }

  ExecutionResult {
    execution_id,
    steps: run.steps,
    events: run.trace.into_events(),
    stopped: true,
    error: failure,
    termination,
  }
}

/// Visit one node. Loop nodes are bookkeeping only and leave no
/// enter/exit events; every other node is bracketed by them.
async fn step(
  workflow: &ExecutableWorkflow,
  node: &CompiledNode,
  arrival: EdgeKind,
  context: &mut ExecutionContext,
  handlers: &dyn ActionHandlers,
  store: &dyn VariableStore,
  run: &mut Run,
) -> Result<Flow, RuntimeError> {
  let bracketed = !matches!(node.typed(), Some(NodeKind::Loop(_)));

  if bracketed {
    run.trace.record(
      EventKind::NodeEnter,
      Some(&node.id),
      format!("entering {}", node.node_type),
      None,
    );
  }

  let flow = match &node.kind {
    _ if node.disabled && bracketed => {
      run.trace.record(
        EventKind::Log,
        Some(&node.id),
        format!("{} node is disabled, skipping", node.node_type),
        None,
      );
      Flow::Follow(DEFAULT_HANDLE.to_string())
    }
    CompiledKind::Inert { reason } => {
      warn!(
        execution_id = %run.trace.execution_id(),
        node_id = %node.id,
        reason = %reason,
        "node_skipped"
      );
      run.trace.record(
        EventKind::Log,
        Some(&node.id),
        format!("{}, skipping", reason),
        None,
      );
      Flow::Follow(DEFAULT_HANDLE.to_string())
    }
    CompiledKind::Typed(kind) => {
      dispatch(workflow, &node.id, kind, arrival, context, handlers, store, run).await?
    }
  };

  if bracketed {
    let data = match &flow {
      Flow::Follow(handle) => json!({ "handle": handle }),
      Flow::Stop => json!({ "handle": null }),
    };
    run.trace.record(
      EventKind::NodeExit,
      Some(&node.id),
      format!("leaving {}", node.node_type),
      Some(data),
    );
  }
  Ok(flow)
}
