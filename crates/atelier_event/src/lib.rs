//! # atelier_event - Typed Signal Channels
//!
//! Synchronous event channels with:
//! - One payload type per channel
//! - Registration-order delivery on the calling thread
//! - An enable/disable gate that keeps listeners registered
//! - Scoped gating via [`SignalGuard`]
//!
//! ## Example
//!
//! ```
//! use atelier_event::Signal;
//!
//! let renamed: Signal<String> = Signal::new("renamed");
//! let id = renamed.add(|name| println!("renamed to {name}"));
//! renamed.dispatch(&"Box 1".to_string());
//! renamed.remove(id);
//! ```
//!
//! Listeners see a snapshot of the listener list taken when dispatch starts:
//! adding or removing a listener from inside a listener only affects the
//! next dispatch.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Listener callback type
pub type Listener<P> = Rc<dyn Fn(&P)>;

/// Handle returned by [`Signal::add`], used to remove the listener again
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Something that can be switched on and off
pub trait Gate {
    /// Set the gate, returning the previous state
    fn set_active(&self, active: bool) -> bool;
}

/// A named synchronous channel carrying payloads of type `P`.
pub struct Signal<P: 'static> {
    name: &'static str,
    listeners: RefCell<Vec<(ListenerId, Listener<P>)>>,
    next_id: Cell<u64>,
    active: Cell<bool>,
}

impl<P: 'static> Signal<P> {
    /// Create an active channel with no listeners
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            active: Cell::new(true),
        }
    }

    /// Channel name, for logging
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register a listener. Listeners fire in registration order.
    pub fn add<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&P) + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Unregister a listener. Returns false if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Remove every listener
    pub fn remove_all(&self) {
        self.listeners.borrow_mut().clear();
    }

    /// Deliver `payload` to every listener.
    ///
    /// Returns the number of listeners invoked; 0 while the channel is
    /// inactive.
    pub fn dispatch(&self, payload: &P) -> usize {
        if !self.active.get() {
            log::trace!("Signal '{}' inactive, dropping dispatch", self.name);
            return 0;
        }

        // Snapshot so listeners may add/remove without touching this pass.
        let snapshot: Vec<Listener<P>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in &snapshot {
            listener(payload);
        }
        snapshot.len()
    }

    /// Whether dispatch currently delivers
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Check if no listeners are registered
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

impl<P: 'static> Gate for Signal<P> {
    fn set_active(&self, active: bool) -> bool {
        self.active.replace(active)
    }
}

impl<P: 'static> Signal<P> {
    /// Set the gate, returning the previous state
    pub fn set_active(&self, active: bool) -> bool {
        Gate::set_active(self, active)
    }
}

impl<P: 'static> fmt::Debug for Signal<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("listeners", &self.len())
            .field("active", &self.is_active())
            .finish()
    }
}

/// Deactivates a set of channels and restores their previous state on drop.
///
/// ```
/// use atelier_event::{Signal, SignalGuard};
///
/// let changed: Signal<()> = Signal::new("changed");
/// {
///     let _guard = SignalGuard::new().block(&changed);
///     assert!(!changed.is_active());
/// }
/// assert!(changed.is_active());
/// ```
#[derive(Default)]
pub struct SignalGuard<'a> {
    blocked: Vec<(&'a dyn Gate, bool)>,
}

impl<'a> SignalGuard<'a> {
    pub fn new() -> Self {
        Self {
            blocked: Vec::new(),
        }
    }

    /// Deactivate another channel for the lifetime of the guard
    pub fn block(mut self, gate: &'a dyn Gate) -> Self {
        let previous = gate.set_active(false);
        self.blocked.push((gate, previous));
        self
    }
}

impl Drop for SignalGuard<'_> {
    fn drop(&mut self) {
        // Reverse order so a channel blocked twice ends up as it started.
        for (gate, previous) in self.blocked.drain(..).rev() {
            gate.set_active(previous);
        }
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{Gate, Listener, ListenerId, Signal, SignalGuard};
}
