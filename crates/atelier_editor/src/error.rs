//! Error types for the editor kernel.

use atelier_core::{CommandId, NodeId};
use thiserror::Error;

/// A scene mutation that could not be carried out.
///
/// These indicate a logic error in the caller (a stale id, a move into a
/// node's own subtree); the history never swallows them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {0} is already in the scene")]
    NodeAttached(NodeId),

    #[error("Node {0} is not in the scene")]
    NodeDetached(NodeId),

    #[error("Node {0} already exists")]
    NodeExists(NodeId),

    #[error("Cannot move {node} under {parent}: {reason}")]
    InvalidMove {
        node: NodeId,
        parent: NodeId,
        reason: String,
    },

    #[error("Invalid value for property `{property}`: {reason}")]
    InvalidValue { property: String, reason: String },
}

/// Result type for scene mutations
pub type CommandResult<T = ()> = Result<T, CommandError>;

/// Error raised by the command history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("History entry {0} has neither a live command nor a snapshot")]
    MissingSnapshot(CommandId),

    #[error("History serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Error while reading or building a scene document.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Scene JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported scene document version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Node id {0} appears more than once")]
    DuplicateId(NodeId),

    #[error(transparent)]
    Graph(#[from] CommandError),
}
