use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use docdelta::PairFingerprint;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::{AnalysisResponse, EngineError};

type Slot = Arc<OnceCell<Arc<AnalysisResponse>>>;

/// Completed responses keyed by document-pair fingerprint, with single-flight.
///
/// Concurrent requests for the same pair wait on one computation. Failed computations are
/// not stored; the next request for the pair runs again. Completed entries are evicted
/// oldest first once `capacity` is exceeded. A capacity of 0 disables the cache.
pub struct ResponseCache {
    capacity: usize,
    slots: DashMap<PairFingerprint, Slot>,
    completed: Mutex<VecDeque<PairFingerprint>>,
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: DashMap::new(),
            completed: Mutex::new(VecDeque::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Completed entries.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &PairFingerprint) -> Option<Arc<AnalysisResponse>> {
        self.slots.get(key).and_then(|slot| slot.get().cloned())
    }

    pub async fn get_or_compute<F, Fut>(
        &self,
        key: PairFingerprint,
        compute: F,
    ) -> Result<Arc<AnalysisResponse>, EngineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AnalysisResponse, EngineError>>,
    {
        if self.capacity == 0 {
            return compute().await.map(Arc::new);
        }

        let slot = match self.slots.entry(key) {
            Entry::Occupied(entry) => {
                let slot = Arc::clone(entry.get());
                if slot.initialized() {
                    info!(pair = %key.short(12), "cache hit");
                } else {
                    info!(pair = %key.short(12), "joining in-flight analysis");
                }
                slot
            }
            Entry::Vacant(entry) => {
                let slot: Slot = Arc::new(OnceCell::new());
                entry.insert(Arc::clone(&slot));
                slot
            }
        };

        let mut computed = false;
        let ran = &mut computed;
        let outcome = slot
            .get_or_try_init(move || async move {
                *ran = true;
                compute().await.map(Arc::new)
            })
            .await
            .cloned();
        drop(slot);

        match &outcome {
            Ok(_) if computed => self.record(key),
            Ok(_) => {}
            Err(err) => {
                debug!(pair = %key.short(12), error = %err, "analysis failed, not caching");
                self.abandon(&key);
            }
        }
        outcome
    }

    /// Forget a computation that never completed, e.g. one cancelled by a timeout.
    ///
    /// The slot stays while another caller still waits on it; that caller takes the
    /// computation over.
    pub fn abandon(&self, key: &PairFingerprint) {
        self.slots
            .remove_if(key, |_, slot| !slot.initialized() && Arc::strong_count(slot) == 1);
    }

    fn record(&self, key: PairFingerprint) {
        let evicted: Vec<PairFingerprint> = {
            let mut completed = match self.completed.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            completed.push_back(key);
            let excess = completed.len().saturating_sub(self.capacity);
            completed.drain(..excess).collect()
        };
        for key in evicted {
            self.slots.remove(&key);
            debug!(pair = %key.short(12), "evicted cached response");
        }
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("capacity", &self.capacity)
            .field("entries", &self.slots.len())
            .finish()
    }
}
