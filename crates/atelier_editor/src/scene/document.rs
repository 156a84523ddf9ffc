//! Scene document: the persisted form of a whole scene.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::graph::SceneGraph;
use super::node::NodeSnapshot;
use crate::error::{CommandError, SceneError};
use crate::signals::EditorSignals;

/// Current document format version
pub const SCENE_VERSION: u32 = 1;

/// A scene as stored on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub version: u32,
    pub root: NodeSnapshot,
}

impl SceneDocument {
    pub fn from_json(text: &str) -> Result<Self, SceneError> {
        let document: Self = serde_json::from_str(text)?;
        if document.version != SCENE_VERSION {
            return Err(SceneError::UnsupportedVersion {
                found: document.version,
                expected: SCENE_VERSION,
            });
        }
        Ok(document)
    }

    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl SceneGraph {
    /// Build a graph from a document, keeping node ids
    pub fn from_document(
        document: &SceneDocument,
        signals: Rc<EditorSignals>,
    ) -> Result<Self, SceneError> {
        if document.version != SCENE_VERSION {
            return Err(SceneError::UnsupportedVersion {
                found: document.version,
                expected: SCENE_VERSION,
            });
        }
        Self::from_snapshot(&document.root, signals).map_err(|err| match err {
            CommandError::NodeExists(id) => SceneError::DuplicateId(id),
            other => SceneError::Graph(other),
        })
    }

    /// Snapshot the attached tree
    pub fn to_document(&self) -> Result<SceneDocument, SceneError> {
        Ok(SceneDocument {
            version: SCENE_VERSION,
            root: self.snapshot(self.root())?,
        })
    }
}
