//! Reparent a node.

use atelier_core::NodeId;

use super::command::{node_label, CommandKind, SceneCommand};
use crate::error::CommandResult;
use crate::scene::{Placement, SceneGraph};

#[derive(Clone, Debug, PartialEq)]
pub struct MoveNodeCommand {
    node: NodeId,
    new_parent: NodeId,
    before: Option<NodeId>,
    previous: Option<Placement>,
}

impl MoveNodeCommand {
    /// Move `node` under `new_parent`, in front of `before` or last
    pub fn new(node: NodeId, new_parent: NodeId, before: Option<NodeId>) -> Self {
        Self {
            node,
            new_parent,
            before,
            previous: None,
        }
    }

    pub(crate) fn restored(
        node: NodeId,
        new_parent: NodeId,
        before: Option<NodeId>,
        previous: Option<Placement>,
    ) -> Self {
        Self {
            node,
            new_parent,
            before,
            previous,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn new_parent(&self) -> NodeId {
        self.new_parent
    }

    pub fn before(&self) -> Option<NodeId> {
        self.before
    }

    pub fn previous(&self) -> Option<Placement> {
        self.previous
    }
}

impl SceneCommand for MoveNodeCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::MoveNode
    }

    fn target(&self) -> NodeId {
        self.node
    }

    fn describe(&self, graph: &SceneGraph) -> String {
        format!("Move Object: {}", node_label(graph, self.node))
    }

    fn apply(&mut self, graph: &mut SceneGraph) -> CommandResult {
        self.previous = graph.move_node(self.node, self.new_parent, self.before)?;
        Ok(())
    }

    fn invert(&mut self, graph: &mut SceneGraph) -> CommandResult {
        if let Some(previous) = self.previous {
            graph.move_node_to(self.node, previous.parent, previous.index)?;
        }
        Ok(())
    }
}
