//! Scene nodes and their serialized form.

use std::collections::BTreeMap;
use std::fmt;

use atelier_core::NodeId;
use serde::{Deserialize, Serialize};

/// Property keys stored on the transform rather than in the property map.
pub const TRANSFORM_PROPERTIES: [&str; 3] = ["position", "rotation", "scale"];

/// Position, rotation (Euler, radians) and scale of a node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl Transform {
    /// Read a transform channel by property name
    pub fn channel(&self, property: &str) -> Option<[f32; 3]> {
        match property {
            "position" => Some(self.position),
            "rotation" => Some(self.rotation),
            "scale" => Some(self.scale),
            _ => None,
        }
    }

    /// Mutable access to a transform channel by property name
    pub fn channel_mut(&mut self, property: &str) -> Option<&mut [f32; 3]> {
        match property {
            "position" => Some(&mut self.position),
            "rotation" => Some(&mut self.rotation),
            "scale" => Some(&mut self.scale),
            _ => None,
        }
    }
}

/// Value of an editable node property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Vec3([f32; 3]),
}

impl PropertyValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Vec3(_) => "vec3",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<[f32; 3]> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<[f32; 3]> for PropertyValue {
    fn from(value: [f32; 3]) -> Self {
        Self::Vec3(value)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Vec3([x, y, z]) => write!(f, "({x}, {y}, {z})"),
        }
    }
}

/// A node in the scene arena.
///
/// Name and tree links are owned by the [`SceneGraph`](super::SceneGraph);
/// the rest is plain data.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Opaque type tag ("Mesh", "Light", ...)
    pub kind: String,
    pub transform: Transform,
    pub properties: BTreeMap<String, PropertyValue>,
    /// Unmanaged nodes are helpers, hidden from the hierarchy view. Their
    /// names are registered like any other.
    pub managed: bool,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            children: Vec::new(),
            kind: kind.into(),
            transform: Transform::default(),
            properties: BTreeMap::new(),
            managed: true,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Read a property, including the transform channels
    pub fn property(&self, property: &str) -> Option<PropertyValue> {
        if let Some(v) = self.transform.channel(property) {
            return Some(PropertyValue::Vec3(v));
        }
        self.properties.get(property).cloned()
    }
}

fn is_true(value: &bool) -> bool {
    *value
}

fn default_true() -> bool {
    true
}

/// Serialized subtree, ids included.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub managed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    /// Visit this node and every descendant in pre-order
    pub fn walk(&self, visit: &mut impl FnMut(&NodeSnapshot)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Number of nodes in the subtree
    pub fn count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }
}
