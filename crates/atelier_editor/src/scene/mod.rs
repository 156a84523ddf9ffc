//! The authored scene: node arena, unique names, selection and documents.

mod document;
mod graph;
mod names;
mod node;

pub use document::{SceneDocument, SCENE_VERSION};
pub use graph::{Naming, Placement, SceneGraph, SCENE_KIND};
pub use names::{base_name, NameRegistry};
pub use node::{Node, NodeSnapshot, PropertyValue, Transform, TRANSFORM_PROPERTIES};
