//! The editor context: one scene, its history and everything that
//! observes them.
//!
//! All undoable edits go through [`Editor::execute`]. Listeners on
//! [`EditorSignals`] must not call back into the editor; they queue
//! follow-up commands on the [`CommandQueue`] instead, which runs once the
//! current operation is finished.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use atelier_cache::{CacheControl, FileChange};
use atelier_core::{Clock, CommandId, EditorConfig, NodeId, SystemClock};
use atelier_event::SignalGuard;

use crate::commands::{
    AddNodeCommand, Command, MoveNodeCommand, RemoveNodeCommand, SetNameCommand,
    SetPropertyCommand,
};
use crate::error::{CommandError, HistoryResult, SceneError};
use crate::history::CommandHistory;
use crate::scene::{Naming, PropertyValue, SceneDocument, SceneGraph};
use crate::signals::{EditorSignals, SelectionChange};

/// Kind tag of the editor camera
pub const CAMERA_KIND: &str = "Camera";

/// Commands waiting to run after the current editor operation.
///
/// Cloning shares the queue, so listeners can hold a handle.
#[derive(Clone, Default)]
pub struct CommandQueue {
    pending: Rc<RefCell<VecDeque<(Command, Option<String>)>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, command: impl Into<Command>, name: Option<&str>) {
        self.pending
            .borrow_mut()
            .push_back((command.into(), name.map(str::to_string)));
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    fn pop(&self) -> Option<(Command, Option<String>)> {
        self.pending.borrow_mut().pop_front()
    }

    fn clear(&self) {
        self.pending.borrow_mut().clear();
    }
}

impl std::fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue").field("len", &self.len()).finish()
    }
}

/// Hierarchy view entry; helper nodes are left out
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchyNode {
    pub id: NodeId,
    pub name: String,
    pub children: Vec<HierarchyNode>,
}

/// Editor context.
pub struct Editor {
    config: EditorConfig,
    signals: Rc<EditorSignals>,
    scene: SceneGraph,
    history: CommandHistory,
    camera: NodeId,
    caches: Rc<RefCell<Vec<Rc<dyn CacheControl>>>>,
    modified: Rc<Cell<bool>>,
    scene_uri: Option<String>,
    ignore_next_scene_change: bool,
    queue: CommandQueue,
}

impl Editor {
    /// Create an editor with a new, empty scene
    pub fn new(config: EditorConfig) -> Self {
        Self::with_clock(config, Rc::new(SystemClock::new()))
    }

    /// Create an editor whose history reads time from `clock`
    pub fn with_clock(config: EditorConfig, clock: Rc<dyn Clock>) -> Self {
        let signals = Rc::new(EditorSignals::new());
        let caches: Rc<RefCell<Vec<Rc<dyn CacheControl>>>> = Rc::new(RefCell::new(Vec::new()));
        let modified = Rc::new(Cell::new(false));
        install_listeners(&signals, &caches, &modified);

        let mut scene = SceneGraph::new(&config.scene_name, signals.clone());
        let camera = add_camera(&mut scene, &config.camera_name);
        modified.set(false);
        let history = CommandHistory::new(&config, clock, signals.clone());

        log::info!("Editor created with scene '{}'", config.scene_name);
        Self {
            config,
            signals,
            scene,
            history,
            camera,
            caches,
            modified,
            scene_uri: None,
            ignore_next_scene_change: false,
            queue: CommandQueue::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn signals(&self) -> &Rc<EditorSignals> {
        &self.signals
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn camera(&self) -> NodeId {
        self.camera
    }

    pub fn scene_uri(&self) -> Option<&str> {
        self.scene_uri.as_deref()
    }

    /// Handle for queueing commands from listeners
    pub fn queue(&self) -> CommandQueue {
        self.queue.clone()
    }

    // ---- History ----

    /// Execute and record a command, then run queued commands
    pub fn execute(&mut self, command: impl Into<Command>, name: Option<&str>) -> HistoryResult<CommandId> {
        let id = self.history.execute(&mut self.scene, command.into(), name)?;
        self.flush_pending();
        Ok(id)
    }

    pub fn undo(&mut self) -> HistoryResult<Option<CommandId>> {
        let id = self.history.undo(&mut self.scene)?;
        self.flush_pending();
        Ok(id)
    }

    pub fn redo(&mut self) -> HistoryResult<Option<CommandId>> {
        let id = self.history.redo(&mut self.scene)?;
        self.flush_pending();
        Ok(id)
    }

    pub fn go_to_state(&mut self, target: Option<CommandId>) -> HistoryResult<()> {
        self.history.go_to_state(&mut self.scene, target)?;
        self.flush_pending();
        Ok(())
    }

    pub fn enable_serialization(&mut self, target: Option<CommandId>) -> HistoryResult<()> {
        self.history.enable_serialization(&mut self.scene, target)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn set_history_locked(&mut self, locked: bool) {
        self.history.set_locked(locked);
    }

    /// Serialize both history stacks
    pub fn history_json(&self) -> HistoryResult<String> {
        self.history.to_json()
    }

    /// Replace the history with a serialized one matching the current scene
    pub fn load_history_json(&mut self, text: &str) -> HistoryResult<()> {
        self.history.from_json(text)
    }

    /// Run queued commands in order. Returns how many succeeded.
    ///
    /// A failing command is reported on `editor_error` and dropped; the rest
    /// still run. Commands queued while flushing run in the same pass.
    pub fn flush_pending(&mut self) -> usize {
        let mut executed = 0;
        while let Some((command, name)) = self.queue.pop() {
            match self.history.execute(&mut self.scene, command, name.as_deref()) {
                Ok(_) => executed += 1,
                Err(err) => self.signals.error("Queued command failed", err.to_string()),
            }
        }
        executed
    }

    // ---- Scene edits ----

    /// Create a detached node for [`add_node`](Self::add_node)
    pub fn create_node(&mut self, kind: &str, name: &str) -> NodeId {
        self.scene.create_node(kind, name)
    }

    pub fn add_node(&mut self, node: NodeId, parent: Option<NodeId>) -> HistoryResult<CommandId> {
        self.execute(AddNodeCommand::new(node, parent), None)
    }

    /// Remove a node. The root and the camera are refused with `Ok(None)`.
    pub fn remove_node(&mut self, node: NodeId) -> HistoryResult<Option<CommandId>> {
        if self.is_protected(node) {
            log::warn!("Refusing to remove protected node {}", node);
            return Ok(None);
        }
        self.execute(RemoveNodeCommand::new(node), None).map(Some)
    }

    /// Reparent a node. The root and the camera are refused with `Ok(None)`.
    pub fn move_node(
        &mut self,
        node: NodeId,
        parent: NodeId,
        before: Option<NodeId>,
    ) -> HistoryResult<Option<CommandId>> {
        if self.is_protected(node) {
            log::warn!("Refusing to move protected node {}", node);
            return Ok(None);
        }
        self.execute(MoveNodeCommand::new(node, parent, before), None)
            .map(Some)
    }

    /// Edit a property; `"name"` is routed to a rename
    pub fn set_node_property(
        &mut self,
        node: NodeId,
        property: &str,
        value: impl Into<PropertyValue>,
    ) -> HistoryResult<CommandId> {
        let value = value.into();
        if property == "name" {
            let name = value.as_text().ok_or_else(|| CommandError::InvalidValue {
                property: property.to_string(),
                reason: format!("expected text, got {}", value.type_name()),
            })?;
            return self.set_node_name(node, name);
        }
        self.execute(SetPropertyCommand::new(node, property, value), None)
    }

    pub fn set_node_name(&mut self, node: NodeId, name: &str) -> HistoryResult<CommandId> {
        self.execute(SetNameCommand::new(node, name), None)
    }

    /// Deep-copy `node` next to the original. Returns the copy's id.
    pub fn duplicate_node(&mut self, node: NodeId) -> HistoryResult<Option<NodeId>> {
        let Some(parent) = self.scene.node(node).and_then(|n| n.parent()) else {
            return Ok(None);
        };
        if self.is_protected(node) {
            return Ok(None);
        }

        let copy = self.scene.clone_subtree(node)?;
        self.execute(AddNodeCommand::new(copy, Some(parent)), None)?;
        Ok(Some(copy))
    }

    pub fn duplicate_selected(&mut self) -> HistoryResult<Option<NodeId>> {
        match self.scene.selected() {
            Some(selected) => self.duplicate_node(selected),
            None => Ok(None),
        }
    }

    /// Remove the selection. Returns whether anything was removed.
    pub fn delete_selected(&mut self) -> HistoryResult<bool> {
        let Some(selected) = self.scene.selected() else {
            return Ok(false);
        };
        Ok(self.remove_node(selected)?.is_some())
    }

    // ---- Selection ----

    pub fn select(&mut self, node: NodeId) -> bool {
        self.scene.select(Some(node))
    }

    pub fn deselect(&mut self) -> bool {
        self.scene.select(None)
    }

    /// Select the first node called `name`
    pub fn select_by_name(&mut self, name: &str) -> Option<NodeId> {
        let id = self.scene.find_by_name(name)?;
        self.scene.select(Some(id));
        Some(id)
    }

    /// Ask views to frame `node`. Ignored for the root.
    pub fn focus(&self, node: NodeId) -> bool {
        if node == self.scene.root() || !self.scene.is_attached(node) {
            return false;
        }
        self.signals.object_focused.dispatch(&node);
        true
    }

    pub fn focus_selection(&self) -> bool {
        self.scene.selected().is_some_and(|s| self.focus(s))
    }

    /// Tree of managed nodes, starting at the root
    pub fn node_hierarchy(&self) -> HierarchyNode {
        self.hierarchy_of(self.scene.root())
    }

    fn hierarchy_of(&self, id: NodeId) -> HierarchyNode {
        let node = self.scene.node(id);
        HierarchyNode {
            id,
            name: node.map(|n| n.name().to_string()).unwrap_or_default(),
            children: node
                .map(|n| n.children())
                .unwrap_or_default()
                .iter()
                .filter(|child| self.scene.node(**child).is_some_and(|c| c.managed))
                .map(|child| self.hierarchy_of(*child))
                .collect(),
        }
    }

    fn is_protected(&self, node: NodeId) -> bool {
        self.scene.is_protected(node)
    }

    // ---- Caches and files ----

    /// Register a cache for eviction on file changes
    pub fn register_cache(&self, cache: Rc<dyn CacheControl>) {
        log::debug!("Registered cache '{}'", cache.name());
        self.caches.borrow_mut().push(cache);
    }

    /// Report that the file at `uri` changed on disk.
    ///
    /// Every registered cache forgets `uri`. Returns false when the change
    /// is the echo of the editor's own save of the scene, which callers
    /// should not treat as an external edit.
    pub fn notify_file_changed(&mut self, uri: &str) -> bool {
        let own_save = self.ignore_next_scene_change && self.scene_uri.as_deref() == Some(uri);
        if own_save {
            self.ignore_next_scene_change = false;
        }
        self.signals.file_changed.dispatch(&uri.to_string());
        !own_save
    }

    /// Forward changes polled from a [`FileWatcher`](atelier_cache::FileWatcher).
    ///
    /// Returns how many were treated as external changes.
    pub fn forward_file_changes<I>(&mut self, changes: I) -> usize
    where
        I: IntoIterator<Item = FileChange>,
    {
        changes
            .into_iter()
            .filter(|change| self.notify_file_changed(&change.uri()))
            .count()
    }

    /// Dispose and empty every registered cache
    pub fn clear_caches(&self) {
        for cache in self.caches.borrow().iter() {
            cache.dispose_and_clear();
        }
    }

    // ---- Scene lifecycle ----

    /// Replace the scene with an empty one
    pub fn load_new_scene(&mut self) {
        self.clear_caches();
        let scene = SceneGraph::new(&self.config.scene_name, self.signals.clone());
        self.scene_uri = None;
        self.set_scene(scene);
    }

    /// Replace the scene with `document`
    pub fn open_scene(&mut self, document: &SceneDocument, uri: Option<&str>) -> Result<(), SceneError> {
        self.clear_caches();
        let scene = SceneGraph::from_document(document, self.signals.clone())?;
        self.scene_uri = uri.map(str::to_string);
        self.set_scene(scene);
        Ok(())
    }

    /// Snapshot the scene for saving; the camera is not part of it
    pub fn save_scene(&self) -> Result<SceneDocument, SceneError> {
        let mut document = self.scene.to_document()?;
        document.root.children.retain(|child| child.id != self.camera);
        Ok(document)
    }

    /// Record a completed save to `uri`.
    ///
    /// Clears the modified flag and ignores the next change notification
    /// for `uri`.
    pub fn mark_scene_saved(&mut self, uri: &str) {
        self.scene_uri = Some(uri.to_string());
        self.ignore_next_scene_change = true;
        self.modified.set(false);
        log::info!("Scene saved to '{}'", uri);
    }

    pub fn is_modified(&self) -> bool {
        self.modified.get()
    }

    fn set_scene(&mut self, mut scene: SceneGraph) {
        {
            let _quiet = SignalGuard::new()
                .block(&self.signals.object_added)
                .block(&self.signals.scene_graph_changed);
            self.camera = add_camera(&mut scene, &self.config.camera_name);
        }

        let previous = self.scene.selected();
        self.scene = scene;
        self.queue.clear();
        self.history.clear();
        if previous.is_some() {
            self.signals.object_selected.dispatch(&SelectionChange {
                current: None,
                previous,
            });
        }

        {
            let _quiet = SignalGuard::new().block(&self.signals.scene_modified);
            self.signals.scene_set.dispatch(&());
            self.signals.scene_graph_changed.dispatch(&());
        }
        self.modified.set(false);
        log::info!(
            "Scene set: '{}' ({} nodes)",
            self.scene.node(self.scene.root()).map_or("", |n| n.name()),
            self.scene.len()
        );
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("scene", &self.scene)
            .field("history", &self.history)
            .field("caches", &self.caches.borrow().len())
            .field("modified", &self.modified.get())
            .field("scene_uri", &self.scene_uri)
            .finish_non_exhaustive()
    }
}

/// The camera is a protected helper node: attached under the root and holding
/// a registered name, but hidden from the hierarchy view and left out of saves
fn add_camera(scene: &mut SceneGraph, name: &str) -> NodeId {
    let camera = scene.create_node(CAMERA_KIND, name);
    if let Some(node) = scene.node_mut(camera) {
        node.managed = false;
        node.transform.position = [0.0, 5.0, 10.0];
    }
    if let Err(err) = scene.insert_node(camera, None, None, Naming::Assign) {
        log::error!("Failed to add camera: {}", err);
    }
    scene.protect(camera);
    camera
}

fn install_listeners(
    signals: &Rc<EditorSignals>,
    caches: &Rc<RefCell<Vec<Rc<dyn CacheControl>>>>,
    modified: &Rc<Cell<bool>>,
) {
    let caches = Rc::clone(caches);
    signals.file_changed.add(move |uri| {
        for cache in caches.borrow().iter() {
            if cache.evict(uri) {
                log::debug!("Evicted '{}' from cache '{}'", uri, cache.name());
            }
        }
    });

    let mark_modified = {
        let weak: Weak<EditorSignals> = Rc::downgrade(signals);
        let modified = Rc::clone(modified);
        move || {
            modified.set(true);
            if let Some(signals) = weak.upgrade() {
                signals.scene_modified.dispatch(&());
            }
        }
    };
    let on_change = mark_modified.clone();
    signals.scene_graph_changed.add(move |_| mark_modified());
    signals.object_changed.add(move |_| on_change());
}
