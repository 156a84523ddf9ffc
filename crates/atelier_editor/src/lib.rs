//! # atelier_editor - Scene Authoring Kernel
//!
//! The editing core of a 3D scene editor, without any rendering or UI:
//!
//! - **Scene graph**: node arena with parent/child links, unique display
//!   names and a single selection
//! - **Commands**: add, remove, move, rename and property edits, each
//!   reversible and serializable
//! - **History**: undo/redo with coalescing of rapid edits, time travel to
//!   any recorded state and JSON persistence
//! - **Signals**: typed channels for everything observers care about
//! - **Source loading**: per-node loads through a shared cache where the
//!   latest request wins
//!
//! ## Architecture
//!
//! ```text
//! Caller → Editor → CommandHistory → Command → SceneGraph → EditorSignals
//! ```
//!
//! All modifications go through the command history for undo/redo support.
//!
//! ## Example
//!
//! ```
//! use atelier_editor::prelude::*;
//!
//! let mut editor = Editor::new(EditorConfig::default());
//! let node = editor.create_node("Mesh", "Box");
//! editor.add_node(node, None).unwrap();
//! editor.set_node_property(node, "position", [0.0f32, 1.0, 0.0]).unwrap();
//!
//! editor.undo().unwrap();
//! editor.undo().unwrap();
//! assert!(!editor.scene().is_attached(node));
//! ```

pub mod commands;
pub mod editor;
pub mod error;
pub mod history;
pub mod loading;
pub mod scene;
pub mod signals;

pub use commands::{
    AddNodeCommand, Command, CommandData, CommandKey, CommandKind, CommandSnapshot,
    MoveNodeCommand, RemoveNodeCommand, SceneCommand, SetNameCommand, SetPropertyCommand,
};
pub use editor::{CommandQueue, Editor, HierarchyNode, CAMERA_KIND};
pub use error::{CommandError, CommandResult, HistoryError, HistoryResult, SceneError};
pub use history::{CommandHistory, HistoryDocument, HistoryEntry, HistoryStep};
pub use loading::{LoadOutcome, SourceLoader};
pub use scene::{
    Naming, Node, NodeSnapshot, Placement, PropertyValue, SceneDocument, SceneGraph, Transform,
};
pub use signals::{EditorSignals, Notice, SelectionChange};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::commands::{
        AddNodeCommand, Command, MoveNodeCommand, RemoveNodeCommand, SceneCommand,
        SetNameCommand, SetPropertyCommand,
    };
    pub use crate::editor::Editor;
    pub use crate::history::CommandHistory;
    pub use crate::scene::{PropertyValue, SceneDocument, SceneGraph};
    pub use crate::signals::EditorSignals;
    pub use atelier_core::{CommandId, EditorConfig, NodeId};
}
