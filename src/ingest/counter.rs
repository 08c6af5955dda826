//! Upload identifier allocation
//!
//! Identifiers namespace a batch's object keys. A batch reserves one when its
//! photos start processing and commits it on full success. A reservation that is
//! dropped without commit goes back to the pool and is handed to the next batch,
//! so a retried batch writes to the same keys its failed attempt did while
//! overlapping batches never share an identifier. Committed identifiers are
//! unique but not monotonic: a released id can be committed after a higher one.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};
use log::debug;

#[derive(Debug)]
struct CounterState {
    next: u64,
    released: BTreeSet<u64>,
    committed: u64,
}

/// Process-wide source of upload identifiers
#[derive(Debug)]
pub struct UploadCounter {
    state: Mutex<CounterState>,
}

impl UploadCounter {
    /// Start handing out identifiers at `offset`
    pub fn new(offset: u64) -> Self {
        Self {
            state: Mutex::new(CounterState {
                next: offset,
                released: BTreeSet::new(),
                committed: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CounterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Identifier the next reservation will receive
    pub fn peek(&self) -> u64 {
        let state = self.lock();
        state.released.iter().next().copied().unwrap_or(state.next)
    }

    /// Number of batches committed since start
    pub fn committed(&self) -> u64 {
        self.lock().committed
    }

    /// Reserve the lowest free identifier
    pub fn reserve(&self) -> UploadLease<'_> {
        let mut state = self.lock();
        let id = match state.released.iter().next().copied() {
            Some(id) => {
                state.released.remove(&id);
                id
            }
            None => {
                let id = state.next;
                state.next += 1;
                id
            }
        };
        debug!("Reserved upload identifier {}", id);
        UploadLease {
            counter: self,
            id,
            committed: false,
        }
    }

    fn release(&self, id: u64) {
        let mut state = self.lock();
        state.released.insert(id);
        debug!("Released upload identifier {}", id);
    }
}

/// A reserved identifier; released on drop unless committed
#[derive(Debug)]
pub struct UploadLease<'a> {
    counter: &'a UploadCounter,
    id: u64,
    committed: bool,
}

impl UploadLease<'_> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Keep the identifier for good
    pub fn commit(mut self) {
        self.committed = true;
        self.counter.lock().committed += 1;
        debug!("Committed upload identifier {}", self.id);
    }
}

impl Drop for UploadLease<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.counter.release(self.id);
        }
    }
}
