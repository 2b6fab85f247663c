use std::collections::HashMap;
use std::collections::hash_map::Entry;

use botflow_config::{NodeKind, WorkflowGraph, WorkflowNode};
use tracing::{debug, warn};

use crate::error::CompileError;
use crate::executable::{CompiledKind, CompiledNode, EdgeKind, ExecutableWorkflow, Route};

/// Compile an authored graph into an [`ExecutableWorkflow`].
///
/// The start node is the first trigger in node order. Nodes of an unknown
/// type or with data that does not fit their type compile as inert, so graphs
/// written for newer node types still run; the validator reports them. Edge
/// targets are not checked here; a route to a missing node fails when the run
/// reaches it.
pub fn compile(graph: &WorkflowGraph) -> Result<ExecutableWorkflow, CompileError> {
  let mut nodes = HashMap::with_capacity(graph.nodes.len());
  for node in &graph.nodes {
    let compiled = compile_node(node);
    if nodes.insert(node.id.clone(), compiled).is_some() {
      return Err(CompileError::DuplicateNodeId {
        node_id: node.id.clone(),
      });
    }
  }

  let mut edges: HashMap<String, HashMap<String, Route>> = HashMap::new();
  let mut loop_continuations = HashMap::new();
  for edge in &graph.edges {
    let kind = if edge.is_loop_reentry() {
      loop_continuations.insert(edge.source.clone(), edge.target.clone());
      EdgeKind::LoopReentry
    } else {
      EdgeKind::Forward
    };

    let handles = edges.entry(edge.source.clone()).or_default();
    match handles.entry(edge.handle().to_string()) {
      Entry::Occupied(_) => {
        return Err(CompileError::DuplicateHandle {
          node_id: edge.source.clone(),
          handle: edge.handle().to_string(),
        });
      }
      Entry::Vacant(slot) => {
        slot.insert(Route {
          target: edge.target.clone(),
          kind,
        });
      }
    }
  }

  let start_node_id = graph
    .trigger_nodes()
    .next()
    .map(|n| n.id.clone())
    .ok_or(CompileError::MissingTrigger)?;

  debug!(
    start_node_id = %start_node_id,
    nodes = nodes.len(),
    edges = graph.edges.len(),
    "workflow_compiled"
  );

  Ok(ExecutableWorkflow {
    start_node_id,
    nodes,
    edges,
    loop_continuations,
  })
}

fn compile_node(node: &WorkflowNode) -> CompiledNode {
  let disabled = node.is_disabled();
  let Some(node_type) = node.parsed_type() else {
    let reason = format!("unknown node type '{}'", node.node_type);
    warn!(node_id = %node.id, reason = %reason, "node_compiled_inert");
    return CompiledNode {
      id: node.id.clone(),
      node_type: node.node_type.clone(),
      disabled,
      kind: CompiledKind::Inert { reason },
    };
  };

  let kind = match NodeKind::from_data(node_type, &node.data) {
    Ok(kind) => CompiledKind::Typed(kind),
    Err(e) => {
      warn!(node_id = %node.id, reason = %e, "node_compiled_inert");
      CompiledKind::Inert {
        reason: e.to_string(),
      }
    }
  };
  CompiledNode {
    id: node.id.clone(),
    node_type: node_type.as_str().to_string(),
    disabled,
    kind,
  }
}
