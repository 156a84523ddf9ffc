//! Per-node source loading.
//!
//! A node (an audio emitter, a textured mesh) may request a new source
//! before the previous one arrived. Only the latest request per node gets to
//! publish; earlier ones resolve to [`LoadOutcome::Superseded`].

use std::future::Future;
use std::rc::Rc;

use atelier_cache::{LoadError, RequestTracker, ResourceCache, ResourceLoader};
use atelier_core::NodeId;

use crate::signals::EditorSignals;

/// How a [`SourceLoader::load`] ended
#[derive(Clone, Debug, PartialEq)]
pub enum LoadOutcome<R> {
    Loaded(R),
    /// A later request for the same node was made meanwhile
    Superseded,
    Failed(LoadError),
}

impl<R> LoadOutcome<R> {
    pub fn loaded(self) -> Option<R> {
        match self {
            LoadOutcome::Loaded(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, LoadOutcome::Superseded)
    }
}

/// Loads node sources through a shared cache, latest request wins.
pub struct SourceLoader<L: ResourceLoader> {
    cache: Rc<ResourceCache<L>>,
    requests: RequestTracker<NodeId>,
    signals: Rc<EditorSignals>,
}

impl<L: ResourceLoader> SourceLoader<L> {
    pub fn new(cache: Rc<ResourceCache<L>>, signals: Rc<EditorSignals>) -> Self {
        Self {
            cache,
            requests: RequestTracker::new(),
            signals,
        }
    }

    pub fn cache(&self) -> &Rc<ResourceCache<L>> {
        &self.cache
    }

    /// Request `uri` as the source of `node`.
    ///
    /// The request is recorded, and the cache load started, before this
    /// returns, so a second call for the same node supersedes this one even
    /// if neither future has been polled yet.
    ///
    /// Failures of the latest request are logged and reported on
    /// `editor_error`; outcomes of superseded requests are dropped quietly.
    pub fn load(
        &self,
        node: NodeId,
        uri: &str,
    ) -> impl Future<Output = LoadOutcome<L::Resource>> + '_ {
        let ticket = self.requests.begin(node, uri);
        let pending = self.cache.get(uri);

        async move {
            let result = pending.await;
            if !self.requests.finish(&ticket) {
                log::debug!("Discarding superseded load of '{}' for {}", ticket.uri, node);
                return LoadOutcome::Superseded;
            }

            match result {
                Ok(resource) => LoadOutcome::Loaded(resource),
                Err(err) => {
                    self.signals.error(
                        "Failed to load source",
                        format!("{} ({}): {}", ticket.uri, node, err),
                    );
                    LoadOutcome::Failed(err)
                }
            }
        }
    }

    /// URI of the outstanding request for `node`, if any
    pub fn pending_uri(&self, node: NodeId) -> Option<String> {
        self.requests.latest_uri(&node)
    }

    /// Forget outstanding requests; their loads resolve as superseded
    pub fn cancel_all(&self) {
        self.requests.clear();
    }
}
