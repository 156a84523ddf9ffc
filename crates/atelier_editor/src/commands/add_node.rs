//! Insert a detached node (and its subtree) into the scene.

use atelier_core::NodeId;

use super::command::{node_label, CommandKind, SceneCommand};
use crate::error::CommandResult;
use crate::scene::{Naming, SceneGraph};

#[derive(Clone, Debug, PartialEq)]
pub struct AddNodeCommand {
    node: NodeId,
    parent: Option<NodeId>,
    index: Option<usize>,
    naming: Naming,
}

impl AddNodeCommand {
    /// Add `node` under `parent` (default: the scene root), last
    pub fn new(node: NodeId, parent: Option<NodeId>) -> Self {
        Self {
            node,
            parent,
            index: None,
            naming: Naming::Assign,
        }
    }

    /// Insert at a child index instead of last
    pub fn at_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Rebuilt from a snapshot: names are already final
    pub(crate) fn restored(node: NodeId, parent: Option<NodeId>, index: Option<usize>) -> Self {
        Self {
            node,
            parent,
            index,
            naming: Naming::Restore,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }
}

impl SceneCommand for AddNodeCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::AddNode
    }

    fn target(&self) -> NodeId {
        self.node
    }

    fn describe(&self, graph: &SceneGraph) -> String {
        format!("Add Object: {}", node_label(graph, self.node))
    }

    fn apply(&mut self, graph: &mut SceneGraph) -> CommandResult {
        graph.insert_node(self.node, self.parent, self.index, self.naming)?;
        // Redo must give the node back the names it got the first time.
        self.naming = Naming::Restore;
        graph.select(Some(self.node));
        Ok(())
    }

    fn invert(&mut self, graph: &mut SceneGraph) -> CommandResult {
        graph.remove_node(self.node)?;
        Ok(())
    }
}
