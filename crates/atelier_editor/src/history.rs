//! Undo/redo history with coalescing, snapshots and time travel.
//!
//! Every undoable scene change goes through [`CommandHistory::execute`].
//! Entries carry a live command, a serialized snapshot, or both: entries
//! loaded from JSON start as snapshots only and are rebuilt into live
//! commands the first time they are undone or redone.

use std::rc::Rc;
use std::time::Duration;

use atelier_core::{Clock, CommandId, EditorConfig};
use atelier_event::SignalGuard;
use serde::{Deserialize, Serialize};

use crate::commands::{Command, CommandKind, CommandSnapshot, SceneCommand};
use crate::error::{HistoryError, HistoryResult};
use crate::scene::SceneGraph;
use crate::signals::EditorSignals;

/// Payload of `history_changed`: the entry on top of the undo stack
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryStep {
    pub id: CommandId,
    pub name: String,
    pub kind: CommandKind,
}

/// One undo or redo stack slot.
#[derive(Debug)]
pub struct HistoryEntry {
    id: CommandId,
    name: String,
    kind: CommandKind,
    command: Option<Command>,
    snapshot: Option<CommandSnapshot>,
}

impl HistoryEntry {
    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The live command, if materialized
    pub fn command(&self) -> Option<&Command> {
        self.command.as_ref()
    }

    pub fn snapshot(&self) -> Option<&CommandSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_materialized(&self) -> bool {
        self.command.is_some()
    }

    fn to_step(&self) -> HistoryStep {
        HistoryStep {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Rebuild the live command from the snapshot if needed
    fn materialize(&mut self, graph: &mut SceneGraph) -> HistoryResult<&mut Command> {
        if self.command.is_none() {
            let snapshot = self
                .snapshot
                .as_ref()
                .ok_or(HistoryError::MissingSnapshot(self.id))?;
            log::debug!("Materializing history entry {} '{}'", self.id, self.name);
            self.command = Some(Command::from_data(&snapshot.data, graph)?);
        }
        self.command
            .as_mut()
            .ok_or(HistoryError::MissingSnapshot(self.id))
    }

    fn refresh_snapshot(&mut self, graph: &SceneGraph) -> HistoryResult<()> {
        if let Some(command) = &self.command {
            self.snapshot = Some(CommandSnapshot {
                id: self.id,
                name: self.name.clone(),
                data: command.to_data(graph)?,
            });
        }
        Ok(())
    }
}

/// Persisted history: `{ "undos": [...], "redos": [...] }`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryDocument {
    pub undos: Vec<CommandSnapshot>,
    pub redos: Vec<CommandSnapshot>,
}

/// Undo/redo stacks over a [`SceneGraph`].
pub struct CommandHistory {
    undos: Vec<HistoryEntry>,
    redos: Vec<HistoryEntry>,
    id_counter: u64,
    last_execute: Option<Duration>,
    locked: bool,
    merge_window: Duration,
    eager_snapshots: bool,
    clock: Rc<dyn Clock>,
    signals: Rc<EditorSignals>,
}

impl CommandHistory {
    pub fn new(config: &EditorConfig, clock: Rc<dyn Clock>, signals: Rc<EditorSignals>) -> Self {
        Self {
            undos: Vec::new(),
            redos: Vec::new(),
            id_counter: 0,
            last_execute: None,
            locked: false,
            merge_window: config.merge_window(),
            eager_snapshots: config.eager_snapshots,
            clock,
            signals,
        }
    }

    /// Run `command` and record it.
    ///
    /// If the top entry has the same key, both are updatable and the last
    /// execute was less than the merge window ago, the command is folded
    /// into the top entry, which keeps its id. Otherwise it gets a new id.
    /// Either way the redo stack is cleared.
    pub fn execute(
        &mut self,
        graph: &mut SceneGraph,
        mut command: Command,
        name: Option<&str>,
    ) -> HistoryResult<CommandId> {
        let now = self.clock.now();
        command.apply(graph)?;

        let within_window = self
            .last_execute
            .is_some_and(|last| now.saturating_sub(last) < self.merge_window);
        let mergeable = within_window
            && command.updatable()
            && self.undos.last().is_some_and(|top| {
                top.command.as_ref().is_some_and(|live| {
                    live.updatable() && live.key().is_some() && live.key() == command.key()
                })
            });

        let id = match self.undos.last_mut().filter(|_| mergeable) {
            Some(top) => {
                if let Some(live) = top.command.as_mut() {
                    live.absorb(command);
                }
                if let Some(name) = name {
                    top.name = name.to_string();
                }
                if self.eager_snapshots {
                    top.refresh_snapshot(graph)?;
                }
                log::debug!("Merged into history entry {} '{}'", top.id, top.name);
                top.id
            }
            None => self.push_new(graph, command, name)?,
        };

        self.redos.clear();
        self.last_execute = Some(now);
        self.dispatch_changed();
        Ok(id)
    }

    fn push_new(
        &mut self,
        graph: &SceneGraph,
        command: Command,
        name: Option<&str>,
    ) -> HistoryResult<CommandId> {
        self.id_counter += 1;
        let id = CommandId(self.id_counter);
        let mut entry = HistoryEntry {
            id,
            name: name.map_or_else(|| command.describe(graph), str::to_string),
            kind: command.kind(),
            command: Some(command),
            snapshot: None,
        };
        if self.eager_snapshots {
            entry.refresh_snapshot(graph)?;
        }
        log::debug!("Executed {} '{}'", id, entry.name);
        self.undos.push(entry);
        Ok(id)
    }

    /// Invert the top entry. Returns its id, or `None` if nothing happened.
    ///
    /// If inverting fails the entry stays where it was and the error is
    /// returned.
    pub fn undo(&mut self, graph: &mut SceneGraph) -> HistoryResult<Option<CommandId>> {
        if self.refuse_while_locked("undo") {
            return Ok(None);
        }
        let Some(mut entry) = self.undos.pop() else {
            return Ok(None);
        };
        if let Err(err) = step(&mut entry, graph, Direction::Undo) {
            self.undos.push(entry);
            return Err(err);
        }

        let id = entry.id;
        log::debug!("Undo {} '{}'", id, entry.name);
        self.redos.push(entry);
        self.last_execute = None;
        self.dispatch_changed();
        Ok(Some(id))
    }

    /// Re-apply the top redo entry. Returns its id, or `None` if nothing happened.
    pub fn redo(&mut self, graph: &mut SceneGraph) -> HistoryResult<Option<CommandId>> {
        if self.refuse_while_locked("redo") {
            return Ok(None);
        }
        let Some(mut entry) = self.redos.pop() else {
            return Ok(None);
        };
        if let Err(err) = step(&mut entry, graph, Direction::Redo) {
            self.redos.push(entry);
            return Err(err);
        }

        let id = entry.id;
        log::debug!("Redo {} '{}'", id, entry.name);
        self.undos.push(entry);
        self.last_execute = None;
        self.dispatch_changed();
        Ok(Some(id))
    }

    /// Undo or redo until the undo stack holds exactly the entries with
    /// id `<= target` (`None`: no entries).
    ///
    /// Intermediate steps dispatch nothing; one `scene_graph_changed` and
    /// one `history_changed` follow at the end. Already being at the target
    /// is a no-op without dispatches.
    pub fn go_to_state(
        &mut self,
        graph: &mut SceneGraph,
        target: Option<CommandId>,
    ) -> HistoryResult<()> {
        if self.refuse_while_locked("time travel") {
            return Ok(());
        }
        if !self.needs_undo(target) && !self.needs_redo(target) {
            return Ok(());
        }

        {
            let signals = Rc::clone(&self.signals);
            let _quiet = SignalGuard::new()
                .block(&signals.scene_graph_changed)
                .block(&signals.history_changed);

            while self.needs_redo(target) {
                self.redo(graph)?;
            }
            while self.needs_undo(target) {
                self.undo(graph)?;
            }
        }

        log::debug!("Travelled to state {:?}", target.map(|t| t.raw()));
        self.signals.scene_graph_changed.dispatch(&());
        self.dispatch_changed();
        Ok(())
    }

    fn needs_undo(&self, target: Option<CommandId>) -> bool {
        self.top_id() > target
    }

    fn needs_redo(&self, target: Option<CommandId>) -> bool {
        self.redos
            .last()
            .is_some_and(|next| Some(next.id) <= target)
    }

    /// Make every entry persistable, then return to `target`.
    ///
    /// Rewinds to the start and replays the whole redo stack with
    /// notifications off, snapshotting every entry that lacks one. Listeners
    /// see a single `scene_graph_changed` and `history_changed` at the end.
    pub fn enable_serialization(
        &mut self,
        graph: &mut SceneGraph,
        target: Option<CommandId>,
    ) -> HistoryResult<()> {
        if self.refuse_while_locked("serialization") {
            return Ok(());
        }

        {
            let signals = Rc::clone(&self.signals);
            let _quiet = SignalGuard::new()
                .block(&signals.scene_graph_changed)
                .block(&signals.history_changed);

            self.go_to_state(graph, None)?;
            while !self.redos.is_empty() {
                self.redo(graph)?;
                if let Some(top) = self.undos.last_mut() {
                    if top.snapshot.is_none() {
                        top.refresh_snapshot(graph)?;
                    }
                }
            }
            self.go_to_state(graph, target)?;
        }

        log::info!("Serialization enabled for {} entries", self.undos.len() + self.redos.len());
        self.signals.scene_graph_changed.dispatch(&());
        self.dispatch_changed();
        Ok(())
    }

    /// Drop both stacks and restart ids at 1
    pub fn clear(&mut self) {
        self.undos.clear();
        self.redos.clear();
        self.id_counter = 0;
        self.last_execute = None;
        log::debug!("History cleared");
        self.signals.history_changed.dispatch(&None);
    }

    /// Persistable form of both stacks.
    ///
    /// Entries without a snapshot are skipped with a warning; call
    /// [`enable_serialization`](Self::enable_serialization) first to have
    /// every entry included.
    pub fn to_document(&self) -> HistoryDocument {
        let collect = |entries: &[HistoryEntry]| -> Vec<CommandSnapshot> {
            entries
                .iter()
                .filter_map(|entry| {
                    if entry.snapshot.is_none() {
                        log::warn!("History entry {} '{}' has no snapshot, skipped", entry.id, entry.name);
                    }
                    entry.snapshot.clone()
                })
                .collect()
        };
        HistoryDocument {
            undos: collect(&self.undos),
            redos: collect(&self.redos),
        }
    }

    pub fn to_json(&self) -> HistoryResult<String> {
        Ok(serde_json::to_string(&self.to_document())?)
    }

    /// Replace both stacks with snapshot-only entries.
    ///
    /// The scene is expected to already reflect the undo stack; entries are
    /// rebuilt into live commands lazily.
    pub fn load_document(&mut self, document: HistoryDocument) {
        let entry = |snapshot: CommandSnapshot| HistoryEntry {
            id: snapshot.id,
            name: snapshot.name.clone(),
            kind: snapshot.data.kind(),
            command: None,
            snapshot: Some(snapshot),
        };

        self.undos = document.undos.into_iter().map(entry).collect();
        self.redos = document.redos.into_iter().map(entry).collect();
        self.id_counter = self
            .undos
            .iter()
            .chain(self.redos.iter())
            .map(|e| e.id.raw())
            .max()
            .unwrap_or(0);
        self.last_execute = None;

        log::info!(
            "Loaded history: {} undo, {} redo entries",
            self.undos.len(),
            self.redos.len()
        );
        self.dispatch_changed();
    }

    pub fn from_json(&mut self, text: &str) -> HistoryResult<()> {
        let document: HistoryDocument = serde_json::from_str(text)?;
        self.load_document(document);
        Ok(())
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// While locked, undo, redo and time travel warn and do nothing
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    fn refuse_while_locked(&self, action: &str) -> bool {
        if self.locked {
            self.signals.warn(
                "History locked",
                format!("Cannot {action} while history is locked"),
            );
        }
        self.locked
    }

    fn dispatch_changed(&self) {
        let top = self.undos.last().map(HistoryEntry::to_step);
        self.signals.history_changed.dispatch(&top);
    }

    /// Id of the top undo entry
    pub fn top_id(&self) -> Option<CommandId> {
        self.undos.last().map(|e| e.id)
    }

    pub fn undos(&self) -> &[HistoryEntry] {
        &self.undos
    }

    pub fn redos(&self) -> &[HistoryEntry] {
        &self.redos
    }

    pub fn can_undo(&self) -> bool {
        !self.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redos.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undos.last().map(|e| e.name.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redos.last().map(|e| e.name.as_str())
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Undo,
    Redo,
}

fn step(entry: &mut HistoryEntry, graph: &mut SceneGraph, direction: Direction) -> HistoryResult<()> {
    let command = entry.materialize(graph)?;
    match direction {
        Direction::Undo => command.invert(graph)?,
        Direction::Redo => command.apply(graph)?,
    }
    Ok(())
}

impl std::fmt::Debug for CommandHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHistory")
            .field("undos", &self.undos.len())
            .field("redos", &self.redos.len())
            .field("id_counter", &self.id_counter)
            .field("locked", &self.locked)
            .finish()
    }
}
