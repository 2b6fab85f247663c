use std::collections::{HashMap, HashSet};

use botflow_config::{CURRENT_SCHEMA_VERSION, ValidationIssue, WorkflowEdge, WorkflowGraph, WorkflowNode};

/// Lookups shared by the graph-level and per-node checks.
pub(crate) struct GraphIndex<'a> {
  /// First node for each id.
  pub nodes: HashMap<&'a str, &'a WorkflowNode>,
  /// Number of edges arriving at each node.
  pub incoming: HashMap<&'a str, usize>,
  /// Edges leaving each node, in edge order.
  pub outgoing: HashMap<&'a str, Vec<&'a WorkflowEdge>>,
}

impl<'a> GraphIndex<'a> {
  pub fn new(graph: &'a WorkflowGraph) -> Self {
    let mut nodes = HashMap::new();
    for node in &graph.nodes {
      nodes.entry(node.id.as_str()).or_insert(node);
    }

    let mut incoming: HashMap<&str, usize> = HashMap::new();
    let mut outgoing: HashMap<&str, Vec<&WorkflowEdge>> = HashMap::new();
    for edge in &graph.edges {
      *incoming.entry(edge.target.as_str()).or_default() += 1;
      outgoing.entry(edge.source.as_str()).or_default().push(edge);
    }

    Self {
      nodes,
      incoming,
      outgoing,
    }
  }

  /// Output handles wired on `node_id`.
  pub fn handles(&self, node_id: &str) -> HashSet<&'a str> {
    self
      .outgoing
      .get(node_id)
      .map(|edges| edges.iter().map(|e| e.handle()).collect())
      .unwrap_or_default()
  }
}

/// Graph-level checks. Edge issues name the edge when it has an id.
pub(crate) fn check(graph: &WorkflowGraph, index: &GraphIndex<'_>) -> Vec<ValidationIssue> {
  let mut issues = Vec::new();

  if graph.version != CURRENT_SCHEMA_VERSION {
    issues.push(ValidationIssue::warning(format!(
      "workflow schema version {} does not match the current version {}",
      graph.version, CURRENT_SCHEMA_VERSION
    )));
  }

  match graph.trigger_nodes().count() {
    0 => issues.push(ValidationIssue::error("workflow has no trigger node")),
    1 => {}
    n => issues.push(ValidationIssue::error(format!(
      "workflow has {} trigger nodes, expected exactly one",
      n
    ))),
  }

  let mut seen = HashSet::new();
  for node in &graph.nodes {
    if !seen.insert(node.id.as_str()) {
      issues.push(ValidationIssue::error(format!("duplicate node id '{}'", node.id)).at(&node.id));
    }
  }

  let mut wired = HashSet::new();
  for edge in &graph.edges {
    for end in [&edge.source, &edge.target] {
      if !index.nodes.contains_key(end.as_str()) {
        issues.push(edge_issue(edge, format!("edge references unknown node '{}'", end)));
      }
    }
    if !wired.insert((edge.source.as_str(), edge.handle())) {
      issues.push(edge_issue(
        edge,
        format!(
          "more than one edge leaves handle '{}' of node '{}'",
          edge.handle(),
          edge.source
        ),
      ));
    }
  }

  issues
}

fn edge_issue(edge: &WorkflowEdge, message: String) -> ValidationIssue {
  let issue = ValidationIssue::error(message);
  if edge.id.is_empty() {
    issue
  } else {
    ValidationIssue {
      message: format!("{} (edge '{}')", issue.message, edge.id),
      ..issue
    }
  }
}
