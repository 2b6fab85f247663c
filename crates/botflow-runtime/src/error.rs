//! Runtime error types.

/// Failure reported by a host action handler.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HandlerError {
  /// The host refused or failed to perform the action.
  #[error("{message}")]
  Rejected { message: String },

  /// The host does not implement this action.
  #[error("action not supported: {action}")]
  Unsupported { action: String },
}

impl HandlerError {
  pub fn rejected(message: impl Into<String>) -> Self {
    Self::Rejected {
      message: message.into(),
    }
  }
}

/// Failure reported by a variable store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// A stored value could not be encoded or decoded.
  #[error("variable store serialization failed: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("variable store io failed: {0}")]
  Io(#[from] std::io::Error),
}

/// Errors that fail a single node and end the run.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
  /// An edge leads to a node that is not in the workflow.
  #[error("node not found: {node_id}")]
  NodeNotFound { node_id: String },

  /// A host action handler failed.
  #[error("{action} failed: {source}")]
  Handler {
    action: &'static str,
    #[source]
    source: HandlerError,
  },

  /// The variable store failed.
  #[error("{source}")]
  Store {
    #[from]
    source: StoreError,
  },

  /// Persistent variable scope is not `user` or `guild`.
  #[error("unknown variable scope '{scope}'")]
  UnknownScope { scope: String },

  /// Guild scope was used outside of a guild.
  #[error("guild scope requires a guild in the execution context")]
  MissingGuild,

  /// No channel was configured and the event has none.
  #[error("no channel to send to")]
  MissingChannel,

  /// No user was configured and the event has none.
  #[error("no user to target")]
  MissingUser,

  /// A role node resolved to an empty role id.
  #[error("role id is empty")]
  MissingRole,

  /// The delay did not resolve to a number of milliseconds.
  #[error("invalid delay '{value}'")]
  InvalidDelay { value: String },
}

impl RuntimeError {
  pub(crate) fn handler(action: &'static str) -> impl FnOnce(HandlerError) -> RuntimeError {
    move |source| RuntimeError::Handler { action, source }
  }
}
