//! Edit one node property.

use atelier_core::NodeId;

use super::command::{CommandKey, CommandKind, SceneCommand};
use crate::error::CommandResult;
use crate::scene::{PropertyValue, SceneGraph};

/// Sets a property (transform channels included).
///
/// Consecutive edits of the same property on the same node coalesce, so a
/// drag produces one history entry.
#[derive(Clone, Debug, PartialEq)]
pub struct SetPropertyCommand {
    node: NodeId,
    property: String,
    new_value: PropertyValue,
    /// `None` if the property did not exist; undo removes it again
    old_value: Option<PropertyValue>,
}

impl SetPropertyCommand {
    pub fn new(node: NodeId, property: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            node,
            property: property.into(),
            new_value: value.into(),
            old_value: None,
        }
    }

    pub(crate) fn restored(
        node: NodeId,
        property: String,
        new_value: PropertyValue,
        old_value: Option<PropertyValue>,
    ) -> Self {
        Self {
            node,
            property,
            new_value,
            old_value,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn new_value(&self) -> &PropertyValue {
        &self.new_value
    }

    pub fn old_value(&self) -> Option<&PropertyValue> {
        self.old_value.as_ref()
    }

    pub(crate) fn absorb(&mut self, later: SetPropertyCommand) -> bool {
        self.new_value = later.new_value;
        true
    }
}

impl SceneCommand for SetPropertyCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::SetProperty
    }

    fn target(&self) -> NodeId {
        self.node
    }

    fn describe(&self, _graph: &SceneGraph) -> String {
        format!("Set {}", self.property)
    }

    fn apply(&mut self, graph: &mut SceneGraph) -> CommandResult {
        self.old_value = graph.set_property(self.node, &self.property, self.new_value.clone())?;
        Ok(())
    }

    fn invert(&mut self, graph: &mut SceneGraph) -> CommandResult {
        match self.old_value.clone() {
            Some(old) => graph.set_property(self.node, &self.property, old)?,
            None => graph.unset_property(self.node, &self.property)?,
        };
        Ok(())
    }

    fn key(&self) -> Option<CommandKey> {
        Some(CommandKey {
            target: self.node,
            kind: CommandKind::SetProperty,
            property: Some(self.property.clone()),
        })
    }

    fn updatable(&self) -> bool {
        true
    }
}
