//! Detach a node (and its subtree) from the scene.

use atelier_core::NodeId;

use super::command::{node_label, CommandKind, SceneCommand};
use crate::error::CommandResult;
use crate::scene::{Naming, Placement, SceneGraph};

/// Removes a node; undo puts it back at its old parent and sibling index.
///
/// Removing a node without a parent (the root) does nothing, and so does
/// undoing that.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoveNodeCommand {
    node: NodeId,
    placement: Option<Placement>,
}

impl RemoveNodeCommand {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            placement: None,
        }
    }

    pub(crate) fn restored(node: NodeId, placement: Option<Placement>) -> Self {
        Self { node, placement }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Where the node was before removal, once applied
    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }
}

impl SceneCommand for RemoveNodeCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::RemoveNode
    }

    fn target(&self) -> NodeId {
        self.node
    }

    fn describe(&self, graph: &SceneGraph) -> String {
        format!("Remove Object: {}", node_label(graph, self.node))
    }

    fn apply(&mut self, graph: &mut SceneGraph) -> CommandResult {
        self.placement = graph.remove_node(self.node)?;
        Ok(())
    }

    fn invert(&mut self, graph: &mut SceneGraph) -> CommandResult {
        let Some(placement) = self.placement else {
            return Ok(());
        };
        graph.insert_node(
            self.node,
            Some(placement.parent),
            Some(placement.index),
            Naming::Restore,
        )
    }
}
