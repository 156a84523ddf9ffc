//! Command trait and the command sum type.

use std::fmt;

use atelier_core::NodeId;

use super::{AddNodeCommand, MoveNodeCommand, RemoveNodeCommand, SetNameCommand, SetPropertyCommand};
use crate::error::CommandResult;
use crate::scene::SceneGraph;

/// The kinds of command the history knows how to store and rebuild.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    AddNode,
    RemoveNode,
    MoveNode,
    SetProperty,
    SetName,
}

impl CommandKind {
    /// Tag used in serialized snapshots
    pub fn type_name(self) -> &'static str {
        match self {
            Self::AddNode => "AddNodeCommand",
            Self::RemoveNode => "RemoveNodeCommand",
            Self::MoveNode => "MoveNodeCommand",
            Self::SetProperty => "SetPropertyCommand",
            Self::SetName => "SetNameCommand",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Identity used to decide whether two commands may coalesce.
///
/// Two edits merge only if target, kind and property all match, so edits
/// to different properties of one node stay separate entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommandKey {
    pub target: NodeId,
    pub kind: CommandKind,
    pub property: Option<String>,
}

/// One reversible scene mutation.
///
/// `apply` and `invert` must be exact opposites: after `apply` then
/// `invert` the scene is structurally what it was, down to sibling order.
pub trait SceneCommand {
    fn kind(&self) -> CommandKind;

    /// Node the command acts on
    fn target(&self) -> NodeId;

    /// Human-readable label for the history list, read after `apply`
    fn describe(&self, graph: &SceneGraph) -> String;

    /// Forward effect
    fn apply(&mut self, graph: &mut SceneGraph) -> CommandResult;

    /// Reverse effect
    fn invert(&mut self, graph: &mut SceneGraph) -> CommandResult;

    /// Coalescing identity, if the command can coalesce at all
    fn key(&self) -> Option<CommandKey> {
        None
    }

    /// Whether a later command with the same key may be folded into this one
    fn updatable(&self) -> bool {
        false
    }
}

/// A command of any kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    AddNode(AddNodeCommand),
    RemoveNode(RemoveNodeCommand),
    MoveNode(MoveNodeCommand),
    SetProperty(SetPropertyCommand),
    SetName(SetNameCommand),
}

impl Command {
    fn inner(&self) -> &dyn SceneCommand {
        match self {
            Self::AddNode(c) => c,
            Self::RemoveNode(c) => c,
            Self::MoveNode(c) => c,
            Self::SetProperty(c) => c,
            Self::SetName(c) => c,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn SceneCommand {
        match self {
            Self::AddNode(c) => c,
            Self::RemoveNode(c) => c,
            Self::MoveNode(c) => c,
            Self::SetProperty(c) => c,
            Self::SetName(c) => c,
        }
    }

    /// Fold a later command into this one, keeping this command's "before"
    /// state and taking the other's "after" state.
    ///
    /// Returns false (and changes nothing) when the kinds differ.
    pub fn absorb(&mut self, later: Command) -> bool {
        match (self, later) {
            (Self::SetProperty(this), Self::SetProperty(later)) => this.absorb(later),
            (Self::SetName(this), Self::SetName(later)) => this.absorb(later),
            _ => false,
        }
    }
}

impl SceneCommand for Command {
    fn kind(&self) -> CommandKind {
        self.inner().kind()
    }

    fn target(&self) -> NodeId {
        self.inner().target()
    }

    fn describe(&self, graph: &SceneGraph) -> String {
        self.inner().describe(graph)
    }

    fn apply(&mut self, graph: &mut SceneGraph) -> CommandResult {
        self.inner_mut().apply(graph)
    }

    fn invert(&mut self, graph: &mut SceneGraph) -> CommandResult {
        self.inner_mut().invert(graph)
    }

    fn key(&self) -> Option<CommandKey> {
        self.inner().key()
    }

    fn updatable(&self) -> bool {
        self.inner().updatable()
    }
}

macro_rules! impl_from_command {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Command {
                fn from(command: $ty) -> Self {
                    Self::$variant(command)
                }
            }
        )*
    };
}

impl_from_command! {
    AddNode => AddNodeCommand,
    RemoveNode => RemoveNodeCommand,
    MoveNode => MoveNodeCommand,
    SetProperty => SetPropertyCommand,
    SetName => SetNameCommand,
}

/// Label helper: the node's current name, or its id if it is gone
pub(crate) fn node_label(graph: &SceneGraph, id: NodeId) -> String {
    graph
        .node(id)
        .map_or_else(|| id.to_string(), |n| n.name().to_string())
}
