use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::node_type::NodeType;

/// Graph schema version produced by the current editor.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Output handle used when an edge does not name one.
pub const DEFAULT_HANDLE: &str = "next";

/// Target handle marking an edge that re-enters a loop node.
pub const CONTINUE_HANDLE: &str = "continue";

/// An authoring-time workflow graph, as saved by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
  #[serde(default)]
  pub version: u32,
  #[serde(default)]
  pub nodes: Vec<WorkflowNode>,
  #[serde(default)]
  pub edges: Vec<WorkflowEdge>,
}

impl WorkflowGraph {
  /// Get a node by ID. The first node wins if ids are duplicated.
  pub fn get_node(&self, node_id: &str) -> Option<&WorkflowNode> {
    self.nodes.iter().find(|n| n.id == node_id)
  }

  /// Nodes whose type is one of the trigger variants, in array order.
  pub fn trigger_nodes(&self) -> impl Iterator<Item = &WorkflowNode> {
    self
      .nodes
      .iter()
      .filter(|n| n.parsed_type().is_some_and(|t| t.is_trigger()))
  }
}

/// Editor canvas coordinates. Ignored by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub x: f64,
  pub y: f64,
}

/// A single node of a workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
  pub id: String,
  /// Node type name. Kept as text so unknown types survive a load/save cycle.
  #[serde(rename = "type")]
  pub node_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub position: Option<Position>,
  #[serde(default)]
  pub data: Map<String, Value>,
}

impl WorkflowNode {
  /// Narrow the type name into a known [`NodeType`].
  pub fn parsed_type(&self) -> Option<NodeType> {
    NodeType::parse(&self.node_type)
  }

  /// Whether the node is switched off in the editor.
  pub fn is_disabled(&self) -> bool {
    matches!(self.data.get("disabled"), Some(Value::Bool(true)))
  }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
  #[serde(default)]
  pub id: String,
  pub source: String,
  pub target: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_handle: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub target_handle: Option<String>,
}

impl WorkflowEdge {
  /// The output handle this edge leaves from, defaulting to `next`.
  pub fn handle(&self) -> &str {
    self.source_handle.as_deref().unwrap_or(DEFAULT_HANDLE)
  }

  /// Whether this edge re-enters a loop node.
  pub fn is_loop_reentry(&self) -> bool {
    self.target_handle.as_deref() == Some(CONTINUE_HANDLE)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_deserialize_editor_graph() {
    let graph: WorkflowGraph = serde_json::from_value(json!({
      "version": 2,
      "nodes": [
        { "id": "t", "type": "SlashCommandTrigger", "position": { "x": 0, "y": 0 }, "data": { "commandName": "hi" } },
        { "id": "r", "type": "ReplyMessage", "data": { "content": "hello", "disabled": true } }
      ],
      "edges": [
        { "id": "e1", "source": "t", "target": "r" },
        { "id": "e2", "source": "r", "target": "t", "sourceHandle": "done", "targetHandle": "continue" }
      ]
    }))
    .unwrap();

    assert_eq!(graph.version, 2);
    assert_eq!(graph.nodes.len(), 2);
    assert!(graph.nodes[1].is_disabled());
    assert!(!graph.nodes[0].is_disabled());
    assert_eq!(graph.edges[0].handle(), "next");
    assert_eq!(graph.edges[1].handle(), "done");
    assert!(graph.edges[1].is_loop_reentry());
    assert_eq!(graph.trigger_nodes().count(), 1);
  }

  #[test]
  fn test_unknown_node_type_survives_round_trip() {
    let node: WorkflowNode =
      serde_json::from_value(json!({ "id": "x", "type": "FutureNode", "data": { "a": 1 } })).unwrap();
    assert_eq!(node.parsed_type(), None);

    let value = serde_json::to_value(&node).unwrap();
    assert_eq!(value["type"], "FutureNode");
    assert_eq!(value["data"]["a"], 1);
  }
}
