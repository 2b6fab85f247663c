//! Botflow Workflow
//!
//! This crate compiles an authored [`WorkflowGraph`](botflow_config::WorkflowGraph)
//! into an [`ExecutableWorkflow`]: a start node plus lookup tables that the
//! interpreter walks without re-scanning the edge list.
//!
//! Key differences from the authored graph:
//! - Node data is narrowed into a typed [`NodeKind`](botflow_config::NodeKind)
//! - Edges are indexed by source node and output handle
//! - Loop re-entry edges are a distinct [`EdgeKind`]
//! - Ambiguous wiring (two edges on one handle) is rejected
//! - Nodes the engine cannot run compile as inert rather than failing

mod compile;
mod error;
mod executable;

pub use compile::compile;
pub use error::CompileError;
pub use executable::{CompiledKind, CompiledNode, EdgeKind, ExecutableWorkflow, Route};
