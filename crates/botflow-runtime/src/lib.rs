//! Botflow Runtime
//!
//! This crate walks a compiled workflow for one chat event. It owns the
//! per-run state (variables, loop positions, the event trace) and hands every
//! side effect to the host through [`ActionHandlers`] and [`VariableStore`].
//!
//! A run always produces an [`ExecutionResult`]. Limit breaches, handler
//! failures and missing nodes end the run and are reported in the result's
//! `termination`, `error` and trace.

mod dispatch;
mod error;
mod events;
mod handlers;
mod interpreter;
mod loops;
mod store;

pub use error::{HandlerError, RuntimeError, StoreError};
pub use events::{EventKind, ExecutionEvent, ExecutionResult, Termination};
pub use handlers::{
  ActionHandlers, ChannelMessage, DirectMessage, Embed, EmbedFieldContent, HttpRequestSpec,
  HttpResponse, InteractionPrompt, InteractionResponse, Reply, RoleRequest,
};
pub use interpreter::execute;
pub use store::{MemoryVariableStore, VariableScope, VariableStore};
