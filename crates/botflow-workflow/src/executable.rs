use std::collections::HashMap;

use botflow_config::NodeKind;
use serde::{Deserialize, Serialize};

/// How the interpreter treats arrival over an edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
  #[default]
  Forward,
  /// The end of a loop body returning to its loop node.
  LoopReentry,
}

/// Where an output handle leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
  pub target: String,
  pub kind: EdgeKind,
}

impl Route {
  pub fn is_loop_reentry(&self) -> bool {
    self.kind == EdgeKind::LoopReentry
  }
}

/// What visiting a compiled node does.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CompiledKind {
  Typed(NodeKind),
  /// Unknown type or malformed data. Visiting it only follows `next`.
  Inert { reason: String },
}

/// A node with its data narrowed for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledNode {
  pub id: String,
  /// Canonical type name, or the authored one when it is unknown.
  pub node_type: String,
  pub disabled: bool,
  pub kind: CompiledKind,
}

impl CompiledNode {
  pub fn typed(&self) -> Option<&NodeKind> {
    match &self.kind {
      CompiledKind::Typed(kind) => Some(kind),
      CompiledKind::Inert { .. } => None,
    }
  }
}

/// A compiled workflow ready for execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutableWorkflow {
  pub start_node_id: String,
  pub nodes: HashMap<String, CompiledNode>,
  /// source node id -> output handle -> route.
  pub edges: HashMap<String, HashMap<String, Route>>,
  /// source node id -> loop node it re-enters.
  pub loop_continuations: HashMap<String, String>,
}

impl ExecutableWorkflow {
  /// Get a node by ID.
  pub fn node(&self, node_id: &str) -> Option<&CompiledNode> {
    self.nodes.get(node_id)
  }

  /// Get the route leaving `node_id` through `handle`.
  pub fn route(&self, node_id: &str, handle: &str) -> Option<&Route> {
    self.edges.get(node_id).and_then(|handles| handles.get(handle))
  }

  /// Output handles wired on a node.
  pub fn handles(&self, node_id: &str) -> impl Iterator<Item = &str> {
    self
      .edges
      .get(node_id)
      .into_iter()
      .flat_map(|handles| handles.keys().map(String::as_str))
  }

  pub fn has_handle(&self, node_id: &str, handle: &str) -> bool {
    self.route(node_id, handle).is_some()
  }
}
