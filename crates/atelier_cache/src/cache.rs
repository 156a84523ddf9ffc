//! Resource Cache - memoized, single-flight loading keyed by URI
//!
//! The first `get` of a URI inserts a pending entry *before* returning, so
//! every later `get` for the same URI, made before the load resolves, waits
//! on the same load. A resolved load replaces its pending entry; a failed load
//! removes it, so the next `get` retries.

use crate::loader::{LoadResult, ResourceLoader};
use futures_util::future::{self, LocalBoxFuture, Shared};
use futures_util::FutureExt;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Future returned by [`ResourceCache::get`]
pub type CacheFuture<R> = LocalBoxFuture<'static, LoadResult<R>>;

type SharedLoad<R> = Shared<LocalBoxFuture<'static, LoadResult<R>>>;

/// Stored cache entry
enum CacheEntry<R> {
    /// Load in flight. `generation` tells a finishing load whether the
    /// entry it would update is still its own.
    Pending { generation: u64, load: SharedLoad<R> },
    /// Load finished
    Ready(R),
}

type EntryMap<R> = RefCell<HashMap<String, CacheEntry<R>>>;

/// Cache operations that don't depend on the resource type.
///
/// Lets the editor hold caches of different resource types in one list
/// for invalidation.
pub trait CacheControl {
    /// Cache name, for logging
    fn name(&self) -> &str;

    /// Forget `uri` without disposing it. Returns whether an entry existed.
    fn evict(&self, uri: &str) -> bool;

    /// Dispose every resolved entry and empty the cache
    fn dispose_and_clear(&self);

    /// Number of entries, pending or resolved
    fn len(&self) -> usize;

    /// Check if the cache holds nothing
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// URI-keyed cache around a [`ResourceLoader`].
pub struct ResourceCache<L: ResourceLoader> {
    name: String,
    loader: Rc<L>,
    entries: Rc<EntryMap<L::Resource>>,
    next_generation: Cell<u64>,
}

impl<L: ResourceLoader> ResourceCache<L> {
    /// Create an empty cache
    pub fn new(name: impl Into<String>, loader: L) -> Self {
        Self {
            name: name.into(),
            loader: Rc::new(loader),
            entries: Rc::new(RefCell::new(HashMap::new())),
            next_generation: Cell::new(0),
        }
    }

    /// The loader backing this cache
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Get the resource for `uri`, loading it if needed.
    ///
    /// The entry is created synchronously, so two calls made back to back
    /// share one load even if neither future has been polled yet.
    pub fn get(&self, uri: &str) -> CacheFuture<L::Resource> {
        let mut entries = self.entries.borrow_mut();

        if let Some(entry) = entries.get(uri) {
            return match entry {
                CacheEntry::Ready(resource) => {
                    log::debug!("[{}] hit: {}", self.name, uri);
                    future::ready(Ok(resource.clone())).boxed_local()
                }
                CacheEntry::Pending { load, .. } => {
                    log::debug!("[{}] joining in-flight load: {}", self.name, uri);
                    load.clone().boxed_local()
                }
            };
        }

        let generation = self.next_generation.get();
        self.next_generation.set(generation + 1);
        log::debug!("[{}] miss, loading: {}", self.name, uri);

        let load = settle(
            self.name.clone(),
            uri.to_string(),
            generation,
            Rc::downgrade(&self.entries),
            self.loader.load(uri),
        )
        .boxed_local()
        .shared();

        entries.insert(
            uri.to_string(),
            CacheEntry::Pending {
                generation,
                load: load.clone(),
            },
        );

        load.boxed_local()
    }

    /// The resolved resource for `uri`, without starting a load
    pub fn peek(&self, uri: &str) -> Option<L::Resource> {
        match self.entries.borrow().get(uri) {
            Some(CacheEntry::Ready(resource)) => Some(resource.clone()),
            _ => None,
        }
    }

    /// Check whether an entry exists, pending or resolved
    pub fn contains(&self, uri: &str) -> bool {
        self.entries.borrow().contains_key(uri)
    }

    /// Check whether `uri` has finished loading
    pub fn is_loaded(&self, uri: &str) -> bool {
        matches!(self.entries.borrow().get(uri), Some(CacheEntry::Ready(_)))
    }

    /// Remove the entry for `uri`.
    ///
    /// The disposer is not called: consumers that already hold the resource
    /// keep using it, and the next `get` loads a fresh copy.
    pub fn evict(&self, uri: &str) -> bool {
        let removed = self.entries.borrow_mut().remove(uri).is_some();
        if removed {
            log::debug!("[{}] evicted: {}", self.name, uri);
        }
        removed
    }

    /// Dispose every resolved resource, then empty the cache.
    ///
    /// Disposer failures are logged and skipped. Pending loads are dropped;
    /// when they finish they find no entry and leave the cache alone.
    pub fn dispose_and_clear(&self) {
        let drained = std::mem::take(&mut *self.entries.borrow_mut());
        let mut disposed = 0usize;

        for (uri, entry) in drained {
            if let CacheEntry::Ready(resource) = entry {
                match self.loader.dispose(&uri, &resource) {
                    Ok(()) => disposed += 1,
                    Err(err) => log::error!("[{}] {}", self.name, err),
                }
            }
        }

        log::debug!("[{}] cleared, {} resources disposed", self.name, disposed);
    }

    /// Number of entries, pending or resolved
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// Await the loader, then record the outcome if the entry is still ours.
async fn settle<R: Clone + 'static>(
    name: String,
    uri: String,
    generation: u64,
    entries: Weak<EntryMap<R>>,
    load: LocalBoxFuture<'static, LoadResult<R>>,
) -> LoadResult<R> {
    let result = load.await;

    let Some(entries) = entries.upgrade() else {
        return result;
    };
    let mut entries = entries.borrow_mut();

    let still_current = matches!(
        entries.get(&uri),
        Some(CacheEntry::Pending { generation: g, .. }) if *g == generation
    );
    if !still_current {
        log::debug!("[{}] load for {} finished after eviction", name, uri);
        return result;
    }

    match &result {
        Ok(resource) => {
            entries.insert(uri, CacheEntry::Ready(resource.clone()));
        }
        Err(err) => {
            log::warn!("[{}] failed to load {}: {}", name, uri, err);
            entries.remove(&uri);
        }
    }

    result
}

impl<L: ResourceLoader> CacheControl for ResourceCache<L> {
    fn name(&self) -> &str {
        &self.name
    }

    fn evict(&self, uri: &str) -> bool {
        ResourceCache::evict(self, uri)
    }

    fn dispose_and_clear(&self) {
        ResourceCache::dispose_and_clear(self)
    }

    fn len(&self) -> usize {
        ResourceCache::len(self)
    }
}

impl<L: ResourceLoader> fmt::Debug for ResourceCache<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.borrow();
        let ready = entries
            .values()
            .filter(|e| matches!(e, CacheEntry::Ready(_)))
            .count();
        f.debug_struct("ResourceCache")
            .field("name", &self.name)
            .field("ready", &ready)
            .field("pending", &(entries.len() - ready))
            .finish()
    }
}
