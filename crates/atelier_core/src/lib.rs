//! # atelier_core - Atelier Core
//!
//! Small shared primitives for the scene-authoring kernel:
//! - **Identifiers**: stable node ids and monotonically assigned command ids
//! - **Time**: a pluggable monotonic clock (real or manually driven)
//! - **Configuration**: TOML-backed editor settings
//!
//! Nothing in here knows about scenes or commands; the higher crates
//! build on these types.

pub mod config;
pub mod error;
pub mod id;
pub mod time;

pub use config::EditorConfig;
pub use error::{ConfigError, Result};
pub use id::{CommandId, NodeId, NodeIdAllocator};
pub use time::{Clock, ManualClock, SystemClock};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::EditorConfig;
    pub use crate::error::{ConfigError, Result};
    pub use crate::id::{CommandId, NodeId, NodeIdAllocator};
    pub use crate::time::{Clock, ManualClock, SystemClock};
}
