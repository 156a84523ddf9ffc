//! Rename a node.

use atelier_core::NodeId;

use super::command::{CommandKey, CommandKind, SceneCommand};
use crate::error::{CommandError, CommandResult};
use crate::scene::{Naming, SceneGraph};

/// Renames a node through the name registry.
///
/// The registry may hand out a suffixed variant of the requested name; the
/// name actually given is remembered so redo reproduces it.
#[derive(Clone, Debug, PartialEq)]
pub struct SetNameCommand {
    node: NodeId,
    new_name: String,
    old_name: Option<String>,
    assigned: Option<String>,
}

impl SetNameCommand {
    pub fn new(node: NodeId, name: impl Into<String>) -> Self {
        Self {
            node,
            new_name: name.into(),
            old_name: None,
            assigned: None,
        }
    }

    pub(crate) fn restored(
        node: NodeId,
        new_name: String,
        old_name: Option<String>,
        assigned: Option<String>,
    ) -> Self {
        Self {
            node,
            new_name,
            old_name,
            assigned,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The name that was asked for
    pub fn new_name(&self) -> &str {
        &self.new_name
    }

    pub fn old_name(&self) -> Option<&str> {
        self.old_name.as_deref()
    }

    /// The name the node actually got, once applied
    pub fn assigned_name(&self) -> Option<&str> {
        self.assigned.as_deref()
    }

    pub(crate) fn absorb(&mut self, later: SetNameCommand) -> bool {
        self.new_name = later.new_name;
        self.assigned = later.assigned;
        true
    }
}

impl SceneCommand for SetNameCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::SetName
    }

    fn target(&self) -> NodeId {
        self.node
    }

    fn describe(&self, graph: &SceneGraph) -> String {
        let old = self.old_name.as_deref().unwrap_or("?");
        let new = self
            .assigned
            .as_deref()
            .or_else(|| graph.node(self.node).map(|n| n.name()))
            .unwrap_or(&self.new_name);
        format!("Set Name: {old} -> {new}")
    }

    fn apply(&mut self, graph: &mut SceneGraph) -> CommandResult {
        let current = graph
            .node(self.node)
            .ok_or(CommandError::NodeNotFound(self.node))?
            .name()
            .to_string();

        let assigned = match &self.assigned {
            Some(assigned) => graph.set_name(self.node, assigned, Naming::Restore)?,
            None => graph.set_name(self.node, &self.new_name, Naming::Assign)?,
        };

        self.old_name = Some(current);
        self.assigned = Some(assigned);
        Ok(())
    }

    fn invert(&mut self, graph: &mut SceneGraph) -> CommandResult {
        if let Some(old) = &self.old_name {
            graph.set_name(self.node, old, Naming::Restore)?;
        }
        Ok(())
    }

    fn key(&self) -> Option<CommandKey> {
        Some(CommandKey {
            target: self.node,
            kind: CommandKind::SetName,
            property: None,
        })
    }

    fn updatable(&self) -> bool {
        true
    }
}
