//! Scene graph: node arena, name registry and selection.
//!
//! Nodes live in an arena keyed by [`NodeId`]; parent/child links are ids.
//! A node that is removed from the tree stays in the arena, detached, so
//! undo can put the very same node back. Every mutation that changes the
//! attached tree dispatches on the shared [`EditorSignals`].

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use atelier_core::{NodeId, NodeIdAllocator};

use super::names::NameRegistry;
use super::node::{Node, NodeSnapshot, PropertyValue, TRANSFORM_PROPERTIES};
use crate::error::{CommandError, CommandResult};
use crate::signals::{EditorSignals, SelectionChange};

/// Kind tag of the scene root
pub const SCENE_KIND: &str = "Scene";

/// How an inserted or renamed node gets its display name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Naming {
    /// Fresh name from the registry (new nodes, new renames)
    Assign,
    /// Keep the node's previous name if it is free (undo/redo)
    Restore,
}

/// Where a node sat before it was detached or moved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub parent: NodeId,
    pub index: usize,
}

/// The authored scene.
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    names: NameRegistry,
    selected: Option<NodeId>,
    /// Nodes besides the root that cannot be removed or moved
    protected: HashSet<NodeId>,
    ids: NodeIdAllocator,
    signals: Rc<EditorSignals>,
}

impl SceneGraph {
    /// Create a scene with only a root node
    pub fn new(root_name: &str, signals: Rc<EditorSignals>) -> Self {
        let mut ids = NodeIdAllocator::new();
        let root = ids.next();
        let mut names = NameRegistry::new();
        let name = names.assign(root_name);

        let mut nodes = HashMap::new();
        nodes.insert(root, Node::new(root, SCENE_KIND, name));

        Self {
            nodes,
            root,
            names,
            selected: None,
            protected: HashSet::new(),
            ids,
            signals,
        }
    }

    /// Rebuild a scene from a root snapshot, keeping node ids.
    ///
    /// Names are registered in pre-order; a name already taken earlier in
    /// the traversal is renamed through the registry.
    pub(crate) fn from_snapshot(
        root: &NodeSnapshot,
        signals: Rc<EditorSignals>,
    ) -> CommandResult<Self> {
        let mut graph = Self {
            nodes: HashMap::new(),
            root: root.id,
            names: NameRegistry::new(),
            selected: None,
            protected: HashSet::new(),
            ids: NodeIdAllocator::new(),
            signals,
        };

        graph.check_absent(root)?;
        graph.build(root, false, None);

        for id in graph.subtree(graph.root) {
            if let Some(node) = graph.nodes.get_mut(&id) {
                let restored = graph.names.restore(&node.name);
                if restored != node.name {
                    log::warn!("Duplicate name '{}' renamed to '{}'", node.name, restored);
                    node.name = restored;
                }
            }
        }

        Ok(graph)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Mutable access to a node's plain data.
    ///
    /// Name and tree links can only change through the graph; edits made
    /// here bypass history and dispatch nothing.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    fn get(&self, id: NodeId) -> CommandResult<&Node> {
        self.nodes.get(&id).ok_or(CommandError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> CommandResult<&mut Node> {
        self.nodes.get_mut(&id).ok_or(CommandError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Check whether `id` is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.nodes.get(&node).and_then(|n| n.parent);
        }
        false
    }

    /// Check whether `id` is `ancestor` or lies below it
    pub fn is_in_subtree(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes.get(&node).and_then(|n| n.parent);
        }
        false
    }

    /// Ids of `id` and its descendants, pre-order
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.nodes.get(&next) else {
                continue;
            };
            out.push(next);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Nodes reachable from the root, pre-order
    pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
        self.subtree(self.root)
            .into_iter()
            .filter_map(move |id| self.nodes.get(&id))
    }

    /// Number of nodes in the arena, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    pub fn signals(&self) -> &Rc<EditorSignals> {
        &self.signals
    }

    /// Pin `id` in place: removing or moving it becomes a no-op
    pub fn protect(&mut self, id: NodeId) {
        self.protected.insert(id);
    }

    /// The root, and any node passed to [`protect`](Self::protect)
    pub fn is_protected(&self, id: NodeId) -> bool {
        id == self.root || self.protected.contains(&id)
    }

    /// First attached node with this exact name
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.iter().find(|n| n.name == name).map(|n| n.id)
    }

    /// Create a detached node. It gets its final name when inserted.
    pub fn create_node(&mut self, kind: impl Into<String>, name: impl Into<String>) -> NodeId {
        let id = self.ids.next();
        self.nodes.insert(id, Node::new(id, kind, name));
        id
    }

    /// Link two detached nodes, for assembling a subtree before insertion
    pub fn append_detached(&mut self, parent: NodeId, child: NodeId) -> CommandResult {
        self.get(parent)?;
        let child_node = self.get(child)?;

        if child == self.root || child_node.parent.is_some() {
            return Err(CommandError::NodeAttached(child));
        }
        if self.is_attached(parent) {
            return Err(CommandError::NodeAttached(parent));
        }
        if self.is_in_subtree(child, parent) {
            return Err(CommandError::InvalidMove {
                node: child,
                parent,
                reason: "parent is inside the node's subtree".to_string(),
            });
        }

        self.get_mut(child)?.parent = Some(parent);
        self.get_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Attach a detached node under `parent` (default: the root).
    ///
    /// Every managed node in the subtree is (re)registered with the name
    /// registry before anything is announced.
    pub fn insert_node(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        index: Option<usize>,
        naming: Naming,
    ) -> CommandResult {
        let parent = parent.unwrap_or(self.root);
        let node = self.get(id)?;
        if id == self.root || node.parent.is_some() {
            return Err(CommandError::NodeAttached(id));
        }
        self.get(parent)?;
        if !self.is_attached(parent) {
            return Err(CommandError::NodeDetached(parent));
        }

        for member in self.subtree(id) {
            self.register(member, naming);
        }

        let siblings = &mut self.get_mut(parent)?.children;
        let index = index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(index, id);
        self.get_mut(id)?.parent = Some(parent);

        let node = self.get(id)?;
        log::debug!("Added {} '{}' under {}", id, node.name, parent);
        self.signals.object_added.dispatch(node);
        self.signals.scene_graph_changed.dispatch(&());
        Ok(())
    }

    /// Detach `id` from the tree, releasing the names of its subtree.
    ///
    /// A protected node (the root, the editor camera) or one without a
    /// parent is left alone and `Ok(None)` is returned. Removing the subtree
    /// that holds the selection clears the selection.
    pub fn remove_node(&mut self, id: NodeId) -> CommandResult<Option<Placement>> {
        if self.is_protected(id) {
            log::warn!("Refusing to remove protected node {}", id);
            return Ok(None);
        }
        let Some(parent) = self.get(id)?.parent else {
            log::warn!("Refusing to remove {}: it has no parent", id);
            return Ok(None);
        };
        if !self.is_attached(id) {
            return Err(CommandError::NodeDetached(id));
        }

        for member in self.subtree(id) {
            self.unregister(member);
        }

        let siblings = &mut self.get_mut(parent)?.children;
        let index = siblings.iter().position(|c| *c == id).unwrap_or(siblings.len());
        siblings.retain(|c| *c != id);
        self.get_mut(id)?.parent = None;

        if self.selected.is_some_and(|s| self.is_in_subtree(id, s)) {
            self.select(None);
        }

        let node = self.get(id)?;
        log::debug!("Removed {} '{}' from {}", id, node.name, parent);
        self.signals.object_removed.dispatch(node);
        self.signals.scene_graph_changed.dispatch(&());
        Ok(Some(Placement { parent, index }))
    }

    /// Reparent `id` under `parent`, in front of `before` (or last).
    ///
    /// Returns the previous placement; `Ok(None)` when `id` is protected or
    /// has no parent.
    pub fn move_node(
        &mut self,
        id: NodeId,
        parent: NodeId,
        before: Option<NodeId>,
    ) -> CommandResult<Option<Placement>> {
        if let Some(before) = before {
            let sibling = self.get(before)?;
            if before == id || sibling.parent != Some(parent) {
                return Err(CommandError::InvalidMove {
                    node: id,
                    parent,
                    reason: format!("{before} is not another child of the new parent"),
                });
            }
        }
        self.relocate(id, parent, |siblings| {
            before
                .and_then(|b| siblings.iter().position(|c| *c == b))
                .unwrap_or(siblings.len())
        })
    }

    /// Reparent `id` under `parent` at a child index
    pub fn move_node_to(
        &mut self,
        id: NodeId,
        parent: NodeId,
        index: usize,
    ) -> CommandResult<Option<Placement>> {
        self.relocate(id, parent, |siblings| index.min(siblings.len()))
    }

    fn relocate(
        &mut self,
        id: NodeId,
        parent: NodeId,
        slot: impl FnOnce(&[NodeId]) -> usize,
    ) -> CommandResult<Option<Placement>> {
        if self.is_protected(id) {
            log::warn!("Refusing to move protected node {}", id);
            return Ok(None);
        }
        let Some(old_parent) = self.get(id)?.parent else {
            log::warn!("Refusing to move {}: it has no parent", id);
            return Ok(None);
        };
        if !self.is_attached(id) {
            return Err(CommandError::NodeDetached(id));
        }
        self.get(parent)?;
        if !self.is_attached(parent) {
            return Err(CommandError::NodeDetached(parent));
        }
        if self.is_in_subtree(id, parent) {
            return Err(CommandError::InvalidMove {
                node: id,
                parent,
                reason: "a node cannot be moved into its own subtree".to_string(),
            });
        }

        let old_siblings = &mut self.get_mut(old_parent)?.children;
        let old_index = old_siblings
            .iter()
            .position(|c| *c == id)
            .unwrap_or(old_siblings.len());
        old_siblings.retain(|c| *c != id);

        let siblings = &mut self.get_mut(parent)?.children;
        let index = slot(siblings);
        siblings.insert(index, id);
        self.get_mut(id)?.parent = Some(parent);

        log::debug!("Moved {} from {} to {}[{}]", id, old_parent, parent, index);
        self.signals.scene_graph_changed.dispatch(&());
        Ok(Some(Placement {
            parent: old_parent,
            index: old_index,
        }))
    }

    /// Rename a node, returning the name it actually got.
    ///
    /// `object_changed` is dispatched once the old name is released and the
    /// new one registered, never in between. Renaming a node to the name it
    /// already has changes nothing.
    pub fn set_name(&mut self, id: NodeId, requested: &str, naming: Naming) -> CommandResult<String> {
        let node = self.get(id)?;
        if node.name == requested {
            return Ok(node.name.clone());
        }

        let name = if self.is_attached(id) {
            let old = node.name.clone();
            self.names.release(&old);
            match naming {
                Naming::Assign => self.names.assign(requested),
                Naming::Restore => self.names.restore(requested),
            }
        } else {
            requested.to_string()
        };

        let node = self.nodes.get_mut(&id).ok_or(CommandError::NodeNotFound(id))?;
        node.name = name.clone();
        self.signals.object_changed.dispatch(node);
        Ok(name)
    }

    /// Set a property (transform channels included), returning the old value
    pub fn set_property(
        &mut self,
        id: NodeId,
        property: &str,
        value: PropertyValue,
    ) -> CommandResult<Option<PropertyValue>> {
        validate_property(property, &value)?;
        let node = self.nodes.get_mut(&id).ok_or(CommandError::NodeNotFound(id))?;

        let old = match node.transform.channel_mut(property) {
            Some(channel) => {
                let old = *channel;
                if let PropertyValue::Vec3(v) = value {
                    *channel = v;
                }
                Some(PropertyValue::Vec3(old))
            }
            None => node.properties.insert(property.to_string(), value),
        };

        self.signals.object_changed.dispatch(node);
        Ok(old)
    }

    /// Remove a property from the property map, returning its value
    pub fn unset_property(&mut self, id: NodeId, property: &str) -> CommandResult<Option<PropertyValue>> {
        if TRANSFORM_PROPERTIES.contains(&property) {
            return Err(CommandError::InvalidValue {
                property: property.to_string(),
                reason: "transform channels cannot be removed".to_string(),
            });
        }
        let node = self.nodes.get_mut(&id).ok_or(CommandError::NodeNotFound(id))?;
        let old = node.properties.remove(property);
        self.signals.object_changed.dispatch(node);
        Ok(old)
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Change the selection. Returns false when nothing changed.
    pub fn select(&mut self, id: Option<NodeId>) -> bool {
        if id == self.selected {
            return false;
        }
        if let Some(id) = id {
            if !self.is_attached(id) {
                log::warn!("Cannot select {}: not in the scene", id);
                return false;
            }
        }

        let previous = std::mem::replace(&mut self.selected, id);
        self.signals.object_selected.dispatch(&SelectionChange {
            current: id,
            previous,
        });
        true
    }

    /// Serialize a subtree, ids included
    pub fn snapshot(&self, id: NodeId) -> CommandResult<NodeSnapshot> {
        let node = self.get(id)?;
        let children = node
            .children
            .iter()
            .map(|child| self.snapshot(*child))
            .collect::<CommandResult<Vec<_>>>()?;

        Ok(NodeSnapshot {
            id: node.id,
            name: node.name.clone(),
            kind: node.kind.clone(),
            transform: node.transform,
            properties: node.properties.clone(),
            managed: node.managed,
            children,
        })
    }

    /// Recreate a serialized subtree as detached nodes with its own ids
    pub fn instantiate(&mut self, snapshot: &NodeSnapshot) -> CommandResult<NodeId> {
        self.check_absent(snapshot)?;
        Ok(self.build(snapshot, false, None))
    }

    /// Deep-copy a subtree into detached nodes with fresh ids
    pub fn clone_subtree(&mut self, id: NodeId) -> CommandResult<NodeId> {
        let snapshot = self.snapshot(id)?;
        Ok(self.build(&snapshot, true, None))
    }

    fn check_absent(&self, snapshot: &NodeSnapshot) -> CommandResult {
        let mut seen = HashSet::new();
        let mut clash = None;
        snapshot.walk(&mut |n| {
            if clash.is_none() && (self.nodes.contains_key(&n.id) || !seen.insert(n.id)) {
                clash = Some(n.id);
            }
        });
        match clash {
            Some(id) => Err(CommandError::NodeExists(id)),
            None => Ok(()),
        }
    }

    fn build(&mut self, snapshot: &NodeSnapshot, fresh_ids: bool, parent: Option<NodeId>) -> NodeId {
        let id = if fresh_ids {
            self.ids.next()
        } else {
            self.ids.reserve(snapshot.id);
            snapshot.id
        };

        let mut node = Node::new(id, snapshot.kind.clone(), snapshot.name.clone());
        node.parent = parent;
        node.transform = snapshot.transform;
        node.properties = snapshot.properties.clone();
        node.managed = snapshot.managed;
        self.nodes.insert(id, node);

        for child in &snapshot.children {
            let child_id = self.build(child, fresh_ids, Some(id));
            if let Some(node) = self.nodes.get_mut(&id) {
                node.children.push(child_id);
            }
        }
        id
    }

    fn register(&mut self, id: NodeId, naming: Naming) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        node.name = match naming {
            Naming::Assign => self.names.assign(&node.name),
            Naming::Restore => self.names.restore(&node.name),
        };
    }

    fn unregister(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get(&id) {
            self.names.release(&node.name);
        }
    }
}

fn validate_property(property: &str, value: &PropertyValue) -> CommandResult {
    if property == "name" {
        return Err(CommandError::InvalidValue {
            property: property.to_string(),
            reason: "names are changed with a rename, not a property edit".to_string(),
        });
    }
    if TRANSFORM_PROPERTIES.contains(&property) && value.as_vec3().is_none() {
        return Err(CommandError::InvalidValue {
            property: property.to_string(),
            reason: format!("expected vec3, got {}", value.type_name()),
        });
    }
    Ok(())
}

impl std::fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneGraph")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("selected", &self.selected)
            .finish()
    }
}
