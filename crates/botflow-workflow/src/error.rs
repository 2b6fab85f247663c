use thiserror::Error;

/// Errors that can occur while compiling a workflow graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
  /// The graph has no trigger node to start from.
  #[error("missing trigger node")]
  MissingTrigger,

  /// Two nodes share an id.
  #[error("duplicate node id: {node_id}")]
  DuplicateNodeId { node_id: String },

  /// More than one edge leaves the same output handle.
  #[error("duplicate edge on handle '{handle}' of node '{node_id}'")]
  DuplicateHandle { node_id: String, handle: String },
}
