//! Botflow Config
//!
//! This crate contains the serializable types shared by every part of the
//! botflow engine. They are the wire contract with the host: graphs come from
//! the editor as JSON, contexts come from the chat platform event, and
//! validation issues go back to the editor.
//!
//! Node `data` stays an open JSON map on the wire so that graphs authored for
//! newer node types still load. [`NodeKind::from_data`] narrows that map into
//! a typed structure once the node type is known.

mod condition;
mod context;
mod graph;
mod issue;
mod limits;
mod node;
mod node_type;

pub use condition::{Condition, ConditionGroup, LogicalOp, Rule};
pub use context::{Channel, ExecutionContext, Guild, User};
pub use graph::{
  CONTINUE_HANDLE, CURRENT_SCHEMA_VERSION, DEFAULT_HANDLE, Position, WorkflowEdge, WorkflowGraph,
  WorkflowNode,
};
pub use issue::{IssueLevel, ValidationIssue};
pub use limits::{ExecutionLimits, LimitOverrides};
pub use node::{
  AddRole, ButtonDef, ButtonStyle, Delay, EmbedField, EmbedMessage, GetPersistentVariable,
  HttpRequest, IfElse, InteractiveMessage, LogLevel, Logger, LoopData, MessageTrigger,
  NodeDataError, NodeKind, RemoveRole, ReplyMessage, RoleChange, SelectMenuDef, SelectOption,
  SendChannelMessage, SendDm, SetPersistentVariable, SetVariable, SlashCommandTrigger, Stop,
  SwitchCase, Template,
};
pub use node_type::{LEGACY_TRIGGER, NodeType};
