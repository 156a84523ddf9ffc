//! Editor event channels.

use std::fmt;

use atelier_core::NodeId;
use atelier_event::Signal;

use crate::history::HistoryStep;
use crate::scene::Node;

/// Payload of `object_selected`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionChange {
    pub current: Option<NodeId>,
    pub previous: Option<NodeId>,
}

/// User-facing message for the error and warning channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Every channel the editor kernel dispatches on.
///
/// Shared as `Rc<EditorSignals>` between the scene graph, the history and
/// whoever observes them.
pub struct EditorSignals {
    /// Top of the undo stack after a history change, `None` when empty
    pub history_changed: Signal<Option<HistoryStep>>,
    pub scene_graph_changed: Signal<()>,
    pub object_added: Signal<Node>,
    pub object_removed: Signal<Node>,
    pub object_changed: Signal<Node>,
    pub object_selected: Signal<SelectionChange>,
    pub object_focused: Signal<NodeId>,
    /// URI of a changed external file
    pub file_changed: Signal<String>,
    pub scene_set: Signal<()>,
    pub scene_modified: Signal<()>,
    pub editor_error: Signal<Notice>,
    pub editor_warning: Signal<Notice>,
}

impl EditorSignals {
    pub fn new() -> Self {
        Self {
            history_changed: Signal::new("history_changed"),
            scene_graph_changed: Signal::new("scene_graph_changed"),
            object_added: Signal::new("object_added"),
            object_removed: Signal::new("object_removed"),
            object_changed: Signal::new("object_changed"),
            object_selected: Signal::new("object_selected"),
            object_focused: Signal::new("object_focused"),
            file_changed: Signal::new("file_changed"),
            scene_set: Signal::new("scene_set"),
            scene_modified: Signal::new("scene_modified"),
            editor_error: Signal::new("editor_error"),
            editor_warning: Signal::new("editor_warning"),
        }
    }

    /// Log a warning and put it on `editor_warning`
    pub fn warn(&self, title: &str, message: impl Into<String>) {
        let notice = Notice::new(title, message);
        log::warn!("{}", notice);
        self.editor_warning.dispatch(&notice);
    }

    /// Log an error and put it on `editor_error`
    pub fn error(&self, title: &str, message: impl Into<String>) {
        let notice = Notice::new(title, message);
        log::error!("{}", notice);
        self.editor_error.dispatch(&notice);
    }
}

impl Default for EditorSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EditorSignals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSignals")
            .field("history_changed", &self.history_changed)
            .field("scene_graph_changed", &self.scene_graph_changed)
            .field("object_selected", &self.object_selected)
            .finish_non_exhaustive()
    }
}
