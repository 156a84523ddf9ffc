//! Integration tests for atelier_cache

use atelier_cache::*;
use futures_util::future::{join, poll_fn};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::task::Poll;

/// Completes on the second poll, so joined futures really interleave.
fn yield_once() -> impl Future<Output = ()> {
    let mut yielded = false;
    poll_fn(move |cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
}

/// Loader that counts calls and can be told to fail.
struct CountingLoader {
    calls: Rc<Cell<usize>>,
    fail_next: Rc<Cell<bool>>,
    disposed: Rc<RefCell<Vec<String>>>,
    refuse_dispose: Option<String>,
}

impl CountingLoader {
    fn new() -> Self {
        Self {
            calls: Rc::new(Cell::new(0)),
            fail_next: Rc::new(Cell::new(false)),
            disposed: Rc::new(RefCell::new(Vec::new())),
            refuse_dispose: None,
        }
    }
}

impl ResourceLoader for CountingLoader {
    type Resource = Rc<String>;

    fn load(&self, uri: &str) -> LoadFuture<Rc<String>> {
        self.calls.set(self.calls.get() + 1);
        let fail = self.fail_next.replace(false);
        let uri = uri.to_string();
        Box::pin(async move {
            yield_once().await;
            if fail {
                Err(LoadError::Io(format!("connection reset while fetching {uri}")))
            } else {
                Ok(Rc::new(format!("data:{uri}")))
            }
        })
    }

    fn dispose(&self, uri: &str, _resource: &Rc<String>) -> Result<(), DisposeError> {
        if self.refuse_dispose.as_deref() == Some(uri) {
            return Err(DisposeError {
                uri: uri.to_string(),
                reason: "still bound".to_string(),
            });
        }
        self.disposed.borrow_mut().push(uri.to_string());
        Ok(())
    }
}

#[test]
fn test_concurrent_gets_share_one_load() {
    let loader = CountingLoader::new();
    let calls = loader.calls.clone();
    let cache = ResourceCache::new("textures", loader);

    let a = cache.get("wood.png");
    let b = cache.get("wood.png");
    let (a, b) = pollster::block_on(join(a, b));

    assert_eq!(calls.get(), 1);
    assert!(Rc::ptr_eq(&a.unwrap(), &b.unwrap()));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_different_uris_load_separately() {
    let loader = CountingLoader::new();
    let calls = loader.calls.clone();
    let cache = ResourceCache::new("textures", loader);

    let (a, b) = pollster::block_on(join(cache.get("a.png"), cache.get("b.png")));
    assert_eq!(*a.unwrap(), "data:a.png");
    assert_eq!(*b.unwrap(), "data:b.png");
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_failure_is_shared_and_not_cached() {
    let loader = CountingLoader::new();
    let calls = loader.calls.clone();
    loader.fail_next.set(true);
    let cache = ResourceCache::new("models", loader);

    let (a, b) = pollster::block_on(join(cache.get("chair.glb"), cache.get("chair.glb")));
    assert!(matches!(a, Err(LoadError::Io(_))));
    assert_eq!(a, b);
    assert!(!cache.contains("chair.glb"));

    let retry = pollster::block_on(cache.get("chair.glb"));
    assert_eq!(*retry.unwrap(), "data:chair.glb");
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_evict_does_not_dispose() {
    let loader = CountingLoader::new();
    let calls = loader.calls.clone();
    let disposed = loader.disposed.clone();
    let cache = ResourceCache::new("textures", loader);

    let held = pollster::block_on(cache.get("a.png")).unwrap();
    assert!(cache.evict("a.png"));
    assert!(!cache.evict("a.png"));
    assert!(disposed.borrow().is_empty());

    // The consumer's handle is untouched; the next get loads afresh.
    let fresh = pollster::block_on(cache.get("a.png")).unwrap();
    assert!(!Rc::ptr_eq(&held, &fresh));
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_evicted_pending_load_does_not_resurrect() {
    let cache = ResourceCache::new("textures", CountingLoader::new());

    let pending = cache.get("a.png");
    cache.evict("a.png");

    let result = pollster::block_on(pending);
    assert!(result.is_ok());
    assert!(!cache.contains("a.png"));
}

#[test]
fn test_stale_load_does_not_overwrite_newer_one() {
    let loader = CountingLoader::new();
    let calls = loader.calls.clone();
    let cache = ResourceCache::new("textures", loader);

    let stale = cache.get("a.png");
    cache.evict("a.png");
    let fresh = cache.get("a.png");
    assert_eq!(calls.get(), 2);

    pollster::block_on(stale).unwrap();
    assert!(cache.contains("a.png"));
    assert!(!cache.is_loaded("a.png"));

    pollster::block_on(fresh).unwrap();
    assert!(cache.is_loaded("a.png"));
}

#[test]
fn test_dispose_and_clear_continues_past_failures() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut loader = CountingLoader::new();
    loader.refuse_dispose = Some("b.png".to_string());
    let disposed = loader.disposed.clone();
    let cache = ResourceCache::new("textures", loader);

    for uri in ["a.png", "b.png", "c.png"] {
        pollster::block_on(cache.get(uri)).unwrap();
    }
    cache.dispose_and_clear();

    let mut disposed = disposed.borrow().clone();
    disposed.sort();
    assert_eq!(disposed, vec!["a.png", "c.png"]);
    assert!(cache.is_empty());
}

#[test]
fn test_dispose_and_clear_skips_pending() {
    let loader = CountingLoader::new();
    let disposed = loader.disposed.clone();
    let cache = ResourceCache::new("textures", loader);

    let pending = cache.get("a.png");
    cache.dispose_and_clear();
    assert!(cache.is_empty());

    pollster::block_on(pending).unwrap();
    assert!(disposed.borrow().is_empty());
    assert!(cache.is_empty());
}

#[test]
fn test_caches_behind_control_trait() {
    let textures = Rc::new(ResourceCache::new("textures", CountingLoader::new()));
    let notes = Rc::new(ResourceCache::new(
        "notes",
        FnLoader::new(|uri: &str| {
            let text = uri.to_string();
            async move { Ok::<_, LoadError>(text) }
        }),
    ));

    pollster::block_on(textures.get("shared.json")).unwrap();
    pollster::block_on(notes.get("shared.json")).unwrap();

    let mut controls: Vec<Rc<dyn CacheControl>> = Vec::new();
    controls.push(textures.clone());
    controls.push(notes.clone());
    let evicted = controls.iter().filter(|c| c.evict("shared.json")).count();

    assert_eq!(evicted, 2);
    assert!(controls.iter().all(|c| c.is_empty()));
    assert_eq!(controls[1].name(), "notes");
}

#[test]
fn test_superseded_request_is_detected() {
    let cache = ResourceCache::new("textures", CountingLoader::new());
    let tracker = RequestTracker::new();

    let first = tracker.begin(7u64, "old.png");
    let first_load = cache.get("old.png");
    let second = tracker.begin(7u64, "new.png");
    let second_load = cache.get("new.png");

    let (old, new) = pollster::block_on(join(first_load, second_load));
    assert!(old.is_ok() && new.is_ok());
    assert!(!tracker.is_current(&first));
    assert!(tracker.finish(&second));
}
