//! Resource Loader - how a cache turns a URI into a resource
//!
//! Every cache instance is built around one loader. Loading is async and may
//! fail; disposal is sync and may fail too, but disposal errors are only
//! ever logged.

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use std::future::Future;
use thiserror::Error;

/// Error during resource loading
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Nothing exists at the URI
    #[error("Resource not found: {0}")]
    NotFound(String),
    /// Transport or filesystem failure
    #[error("IO error: {0}")]
    Io(String),
    /// The bytes arrived but could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
    /// Loader-specific failure
    #[error("{0}")]
    Custom(String),
}

/// Result type for resource loading
pub type LoadResult<T> = Result<T, LoadError>;

/// Error raised while releasing a resource
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to dispose resource '{uri}': {reason}")]
pub struct DisposeError {
    pub uri: String,
    pub reason: String,
}

/// Future produced by a loader
pub type LoadFuture<R> = LocalBoxFuture<'static, LoadResult<R>>;

/// Loads and releases one kind of resource.
///
/// Resources are handed out by clone, so they are usually cheap handles
/// such as `Rc<Texture>`.
pub trait ResourceLoader: 'static {
    /// The resource type
    type Resource: Clone + 'static;

    /// Start loading `uri`
    fn load(&self, uri: &str) -> LoadFuture<Self::Resource>;

    /// Release a resolved resource
    fn dispose(&self, _uri: &str, _resource: &Self::Resource) -> Result<(), DisposeError> {
        Ok(())
    }
}

/// Loader assembled from a pair of closures.
pub struct FnLoader<R, L, D> {
    load: L,
    dispose: D,
    _marker: std::marker::PhantomData<fn() -> R>,
}

impl<R, L, Fut> FnLoader<R, L, fn(&str, &R) -> Result<(), DisposeError>>
where
    R: Clone + 'static,
    L: Fn(&str) -> Fut + 'static,
    Fut: Future<Output = LoadResult<R>> + 'static,
{
    /// A loader whose resources need no explicit release
    pub fn new(load: L) -> Self {
        Self {
            load,
            dispose: |_, _| Ok(()),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<R, L, D> FnLoader<R, L, D> {
    /// Replace the disposer
    pub fn with_disposer<D2>(self, dispose: D2) -> FnLoader<R, L, D2>
    where
        D2: Fn(&str, &R) -> Result<(), DisposeError> + 'static,
    {
        FnLoader {
            load: self.load,
            dispose,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<R, L, D, Fut> ResourceLoader for FnLoader<R, L, D>
where
    R: Clone + 'static,
    L: Fn(&str) -> Fut + 'static,
    Fut: Future<Output = LoadResult<R>> + 'static,
    D: Fn(&str, &R) -> Result<(), DisposeError> + 'static,
{
    type Resource = R;

    fn load(&self, uri: &str) -> LoadFuture<R> {
        (self.load)(uri).boxed_local()
    }

    fn dispose(&self, uri: &str, resource: &R) -> Result<(), DisposeError> {
        (self.dispose)(uri, resource)
    }
}
