//! Stable identifiers for scene nodes and history entries

use core::fmt;
use serde::{Deserialize, Serialize};

/// Identifier of a node in the scene arena.
///
/// Ids are never reused within a scene: a node that leaves the tree keeps
/// its id so history entries can find it again.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Get the raw value
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a history entry. Assigned once, starting at 1.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(pub u64);

impl CommandId {
    /// Get the raw value
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// The id following this one
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Debug for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandId({})", self.0)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out node ids for one scene arena.
#[derive(Debug, Clone, Default)]
pub struct NodeIdAllocator {
    next: u64,
}

impl NodeIdAllocator {
    /// Create a new allocator starting at id 0
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocate the next unique id
    pub fn next(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Make sure `id` is never handed out again.
    ///
    /// Used when nodes are restored with the ids they were saved with.
    pub fn reserve(&mut self, id: NodeId) {
        if id.0 >= self.next {
            self.next = id.0 + 1;
        }
    }

    /// Peek at the id that will be allocated next
    pub fn peek(&self) -> NodeId {
        NodeId(self.next)
    }
}
