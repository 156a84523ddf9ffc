//! # atelier_cache - Single-Flight Resource Cache
//!
//! URI-keyed resource caching with:
//! - Single-flight loads (concurrent `get`s share one load)
//! - Failed loads are never cached
//! - Explicit eviction and bulk disposal
//! - Latest-request tracking for superseded loads
//! - Optional file watching to drive invalidation
//!
//! ## Example
//!
//! ```
//! use atelier_cache::prelude::*;
//! use std::rc::Rc;
//!
//! let cache = ResourceCache::new(
//!     "text",
//!     FnLoader::new(|uri: &str| {
//!         let text = Rc::new(format!("contents of {uri}"));
//!         async move { Ok::<_, LoadError>(text) }
//!     }),
//! );
//!
//! let text = pollster::block_on(cache.get("notes.txt")).unwrap();
//! assert_eq!(*text, "contents of notes.txt");
//! assert!(cache.is_loaded("notes.txt"));
//! ```

pub mod cache;
pub mod loader;
pub mod request;
pub mod watcher;

pub use cache::{CacheControl, CacheFuture, ResourceCache};
pub use loader::{DisposeError, FnLoader, LoadError, LoadFuture, LoadResult, ResourceLoader};
pub use request::{RequestTicket, RequestTracker};
pub use watcher::{FileChange, FileChangeKind, FileWatcher, WatchError};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::cache::{CacheControl, ResourceCache};
    pub use crate::loader::{FnLoader, LoadError, LoadResult, ResourceLoader};
    pub use crate::request::RequestTracker;
}
