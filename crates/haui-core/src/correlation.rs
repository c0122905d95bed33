// ── Request correlation ──
//
// Every outbound request except `auth` needs a unique id. Ids come from a
// shared counter (the UI thread issues service calls while the driver task
// issues handshake requests) and are remembered until their `result`
// arrives, so the result can be routed by what was asked.
//
// The hub rejects an id lower than one it already saw on the connection,
// so allocation and queueing on the writer happen under one lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;

use crate::model::EntityId;
use crate::store::SnapshotMark;

/// What an outstanding request id was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Subscribe,
    Snapshot(SnapshotMark),
    ServiceCall {
        domain: String,
        service: String,
        entity_id: EntityId,
    },
}

/// Id allocator plus the table of requests still awaiting a result.
#[derive(Debug)]
pub struct Correlator {
    counter: AtomicU64,
    pending: DashMap<u64, RequestKind>,
    wire: Mutex<()>,
}

impl Correlator {
    /// The counter starts at 1 and is bumped before use, so the first id
    /// on the wire is 2.
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
            pending: DashMap::new(),
            wire: Mutex::new(()),
        }
    }

    /// Allocate the next id without tracking it.
    pub fn next_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Allocate an id and remember what it was for.
    pub fn register(&self, kind: RequestKind) -> u64 {
        let id = self.next_id();
        self.pending.insert(id, kind);
        id
    }

    /// Allocate an id and hand it to `queue` while holding the wire lock,
    /// so frames enter the writer in id order. A `false` from `queue`
    /// means nothing was sent and the id is forgotten again.
    pub fn issue(&self, kind: RequestKind, queue: impl FnOnce(u64) -> bool) -> Option<u64> {
        let _wire = self.wire.lock().unwrap_or_else(PoisonError::into_inner);
        let id = self.register(kind);
        if queue(id) {
            Some(id)
        } else {
            self.resolve(id);
            None
        }
    }

    /// Take the pending entry for a result's id.
    pub fn resolve(&self, id: u64) -> Option<RequestKind> {
        self.pending.remove(&id).map(|(_, kind)| kind)
    }

    /// Drop every pending entry. Results for them can no longer arrive.
    pub fn clear(&self) {
        self.pending.clear();
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn first_id_is_two_and_ids_increase() {
        let c = Correlator::new();
        assert_eq!(c.next_id(), 2);
        assert_eq!(c.register(RequestKind::Subscribe), 3);
        assert_eq!(c.next_id(), 4);
    }

    #[test]
    fn resolve_removes_entry() {
        let c = Correlator::new();
        let id = c.register(RequestKind::Subscribe);
        assert_eq!(c.pending_len(), 1);
        assert_eq!(c.resolve(id), Some(RequestKind::Subscribe));
        assert_eq!(c.resolve(id), None);
        assert_eq!(c.pending_len(), 0);
    }

    #[test]
    fn unknown_id_resolves_to_none() {
        let c = Correlator::new();
        assert_eq!(c.resolve(999), None);
    }

    #[test]
    fn issued_frames_are_queued_in_id_order() {
        let c = Arc::new(Correlator::new());
        let queued = Arc::new(Mutex::new(Vec::new()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&c);
                let queued = Arc::clone(&queued);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        c.issue(RequestKind::Subscribe, |id| {
                            std::thread::yield_now();
                            queued.lock().unwrap().push(id);
                            true
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let queued = queued.lock().unwrap();
        assert_eq!(queued.len(), 1000);
        assert!(queued.windows(2).all(|w| w[0] < w[1]), "ids queued out of order");
        assert_eq!(c.pending_len(), 1000);
    }

    #[test]
    fn refused_frames_release_their_id() {
        let c = Correlator::new();
        assert_eq!(c.issue(RequestKind::Subscribe, |_| false), None);
        assert_eq!(c.pending_len(), 0);
        assert_eq!(c.issue(RequestKind::Subscribe, |_| true), Some(3));
    }

    #[test]
    fn ids_are_unique_across_threads() {
        let c = Arc::new(Correlator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || (0..250).map(|_| c.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 1000);
        assert_eq!(all[0], 2);
    }
}
