//! Latest-request tracking for supersession
//!
//! Loads carry no cancellation token. Instead each target remembers the most
//! recent request made for it, and a load that finishes checks whether it is
//! still that request before publishing its result.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;

/// Ticket for one request, handed back to [`RequestTracker::is_current`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestTicket<K> {
    pub target: K,
    pub uri: String,
    seq: u64,
}

#[derive(Debug)]
struct Latest {
    uri: String,
    seq: u64,
}

/// Records the latest request per target.
///
/// Requesting the same URI twice still supersedes the first request; the
/// comparison uses a sequence number, not the URI alone.
#[derive(Debug)]
pub struct RequestTracker<K> {
    latest: RefCell<HashMap<K, Latest>>,
    next_seq: Cell<u64>,
}

impl<K: Clone + Eq + Hash> RequestTracker<K> {
    pub fn new() -> Self {
        Self {
            latest: RefCell::new(HashMap::new()),
            next_seq: Cell::new(0),
        }
    }

    /// Start a request, superseding any earlier one for `target`
    pub fn begin(&self, target: K, uri: impl Into<String>) -> RequestTicket<K> {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);

        let uri = uri.into();
        self.latest.borrow_mut().insert(
            target.clone(),
            Latest {
                uri: uri.clone(),
                seq,
            },
        );

        RequestTicket { target, uri, seq }
    }

    /// Whether `ticket` is still the latest request for its target
    pub fn is_current(&self, ticket: &RequestTicket<K>) -> bool {
        self.latest
            .borrow()
            .get(&ticket.target)
            .is_some_and(|latest| latest.seq == ticket.seq)
    }

    /// Clear the record for a finished request.
    ///
    /// Returns false, leaving the record alone, when the ticket was superseded.
    pub fn finish(&self, ticket: &RequestTicket<K>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.latest.borrow_mut().remove(&ticket.target);
        true
    }

    /// URI of the latest outstanding request for `target`
    pub fn latest_uri(&self, target: &K) -> Option<String> {
        self.latest.borrow().get(target).map(|l| l.uri.clone())
    }

    /// Forget every outstanding request
    pub fn clear(&self) {
        self.latest.borrow_mut().clear();
    }

    /// Number of targets with an outstanding request
    pub fn len(&self) -> usize {
        self.latest.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.borrow().is_empty()
    }
}

impl<K: Clone + Eq + Hash> Default for RequestTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}
