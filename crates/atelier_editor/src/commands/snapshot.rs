//! Serialized commands.
//!
//! A snapshot carries everything needed to rebuild a command without the
//! live object that produced it. Wire shape:
//!
//! ```json
//! { "type": "SetPropertyCommand", "id": 3, "name": "Set position",
//!   "node": 1, "property": "position", "old_value": [0, 0, 0], "new_value": [1, 0, 0] }
//! ```

use atelier_core::{CommandId, NodeId};
use serde::{Deserialize, Serialize};

use super::{
    AddNodeCommand, Command, CommandKind, MoveNodeCommand, RemoveNodeCommand, SetNameCommand,
    SetPropertyCommand,
};
use crate::error::CommandResult;
use crate::scene::{NodeSnapshot, Placement, PropertyValue, SceneGraph};

/// A history entry in persistable form
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandSnapshot {
    pub id: CommandId,
    pub name: String,
    #[serde(flatten)]
    pub data: CommandData,
}

/// Kind-specific fields, tagged by `type`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CommandData {
    #[serde(rename = "AddNodeCommand")]
    AddNode {
        node: NodeSnapshot,
        parent: Option<NodeId>,
        #[serde(default)]
        index: Option<usize>,
    },
    #[serde(rename = "RemoveNodeCommand")]
    RemoveNode {
        node: NodeSnapshot,
        parent: Option<NodeId>,
        index: Option<usize>,
    },
    #[serde(rename = "MoveNodeCommand")]
    MoveNode {
        node: NodeId,
        new_parent: NodeId,
        before: Option<NodeId>,
        old_parent: Option<NodeId>,
        old_index: Option<usize>,
    },
    #[serde(rename = "SetPropertyCommand")]
    SetProperty {
        node: NodeId,
        property: String,
        old_value: Option<PropertyValue>,
        new_value: PropertyValue,
    },
    #[serde(rename = "SetNameCommand")]
    SetName {
        node: NodeId,
        old_name: Option<String>,
        new_name: String,
        assigned_name: Option<String>,
    },
}

impl CommandData {
    pub fn kind(&self) -> CommandKind {
        match self {
            CommandData::AddNode { .. } => CommandKind::AddNode,
            CommandData::RemoveNode { .. } => CommandKind::RemoveNode,
            CommandData::MoveNode { .. } => CommandKind::MoveNode,
            CommandData::SetProperty { .. } => CommandKind::SetProperty,
            CommandData::SetName { .. } => CommandKind::SetName,
        }
    }
}

impl Command {
    /// Capture the command's state. Subtrees are read from `graph`.
    pub fn to_data(&self, graph: &SceneGraph) -> CommandResult<CommandData> {
        Ok(match self {
            Command::AddNode(c) => CommandData::AddNode {
                node: graph.snapshot(c.node())?,
                parent: c.parent(),
                index: c.index(),
            },
            Command::RemoveNode(c) => CommandData::RemoveNode {
                node: graph.snapshot(c.node())?,
                parent: c.placement().map(|p| p.parent),
                index: c.placement().map(|p| p.index),
            },
            Command::MoveNode(c) => CommandData::MoveNode {
                node: c.node(),
                new_parent: c.new_parent(),
                before: c.before(),
                old_parent: c.previous().map(|p| p.parent),
                old_index: c.previous().map(|p| p.index),
            },
            Command::SetProperty(c) => CommandData::SetProperty {
                node: c.node(),
                property: c.property().to_string(),
                old_value: c.old_value().cloned(),
                new_value: c.new_value().clone(),
            },
            Command::SetName(c) => CommandData::SetName {
                node: c.node(),
                old_name: c.old_name().map(str::to_string),
                new_name: c.new_name().to_string(),
                assigned_name: c.assigned_name().map(str::to_string),
            },
        })
    }

    /// Rebuild a live command from its snapshot.
    ///
    /// Nodes that an add or remove refers to but the graph lacks are
    /// recreated, detached, from the stored subtree.
    pub fn from_data(data: &CommandData, graph: &mut SceneGraph) -> CommandResult<Command> {
        Ok(match data {
            CommandData::AddNode {
                node,
                parent,
                index,
            } => {
                materialize(node, graph)?;
                AddNodeCommand::restored(node.id, *parent, *index).into()
            }
            CommandData::RemoveNode {
                node,
                parent,
                index,
            } => {
                materialize(node, graph)?;
                RemoveNodeCommand::restored(node.id, placement(*parent, *index)).into()
            }
            CommandData::MoveNode {
                node,
                new_parent,
                before,
                old_parent,
                old_index,
            } => MoveNodeCommand::restored(
                *node,
                *new_parent,
                *before,
                placement(*old_parent, *old_index),
            )
            .into(),
            CommandData::SetProperty {
                node,
                property,
                old_value,
                new_value,
            } => SetPropertyCommand::restored(
                *node,
                property.clone(),
                new_value.clone(),
                old_value.clone(),
            )
            .into(),
            CommandData::SetName {
                node,
                old_name,
                new_name,
                assigned_name,
            } => SetNameCommand::restored(
                *node,
                new_name.clone(),
                old_name.clone(),
                assigned_name.clone(),
            )
            .into(),
        })
    }
}

fn materialize(node: &NodeSnapshot, graph: &mut SceneGraph) -> CommandResult {
    if !graph.contains(node.id) {
        log::debug!("Recreating {} '{}' from snapshot", node.id, node.name);
        graph.instantiate(node)?;
    }
    Ok(())
}

fn placement(parent: Option<NodeId>, index: Option<usize>) -> Option<Placement> {
    parent
        .zip(index)
        .map(|(parent, index)| Placement { parent, index })
}
