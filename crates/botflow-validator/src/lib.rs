//! Botflow Validator
//!
//! Static analysis over an authored [`WorkflowGraph`], independent of
//! compilation. Findings are advisory: errors mean the graph cannot run as
//! authored, warnings mean it runs but may not do what the author expects.
//!
//! Checks run in two passes. Graph-level checks (schema version, trigger
//! count, duplicate ids, dangling and ambiguous edges) come first, then each
//! node is checked in node order (type, required fields, data shape,
//! templates, reachability, output handles).

mod handles;
mod node;
mod structure;

use botflow_config::{ValidationIssue, WorkflowGraph};
use serde_json::Value;
use tracing::debug;

/// Validate an authored graph.
///
/// A graph without nodes yields a single fatal error.
pub fn validate(graph: &WorkflowGraph) -> Vec<ValidationIssue> {
  if graph.nodes.is_empty() {
    return vec![ValidationIssue::error("workflow graph has no nodes")];
  }

  let index = structure::GraphIndex::new(graph);
  let mut issues = structure::check(graph, &index);
  for node in &graph.nodes {
    issues.extend(node::check(graph, &index, node));
  }

  debug!(
    errors = issues.iter().filter(|i| i.is_error()).count(),
    warnings = issues.iter().filter(|i| !i.is_error()).count(),
    "workflow_validated"
  );
  issues
}

/// Validate a graph given as raw JSON.
///
/// JSON that does not have the shape of a graph yields a single fatal error.
pub fn validate_value(value: &Value) -> Vec<ValidationIssue> {
  if !value.is_object() {
    return vec![ValidationIssue::error(
      "malformed workflow graph: expected a JSON object",
    )];
  }
  match serde_json::from_value::<WorkflowGraph>(value.clone()) {
    Ok(graph) => validate(&graph),
    Err(e) => vec![ValidationIssue::error(format!("malformed workflow graph: {}", e))],
  }
}
