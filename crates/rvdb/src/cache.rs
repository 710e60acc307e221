//! Memoized register states.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::{HartId, RegisterState, ReplayError, ReplayTarget, TestId, metrics};

type CacheKey = (TestId, HartId, ReplayTarget);

/// Reconstructed states keyed by (test, hart, target).
///
/// The trace is immutable while open, so entries never go stale. Failed
/// replays are not stored.
#[derive(Debug, Default)]
pub struct ReplayCache {
    entries: RwLock<FxHashMap<CacheKey, Arc<RegisterState>>>,
}

impl ReplayCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(
        &self,
        test: TestId,
        hart: HartId,
        target: ReplayTarget,
    ) -> Option<Arc<RegisterState>> {
        self.entries.read().get(&(test, hart, target)).cloned()
    }

    /// Return the cached state for the key, running `replay` on a miss.
    ///
    /// Two threads missing on the same key may both replay; the first result
    /// stored wins. Replays are deterministic, so both results are equal.
    ///
    /// # Errors
    ///
    /// Returns the error of `replay` on a miss; nothing is stored then.
    pub fn get_or_replay<F>(
        &self,
        test: TestId,
        hart: HartId,
        target: ReplayTarget,
        replay: F,
    ) -> Result<Arc<RegisterState>, ReplayError>
    where
        F: FnOnce() -> Result<RegisterState, ReplayError>,
    {
        if let Some(hit) = self.get(test, hart, target) {
            metrics::record_cache_hit();
            return Ok(hit);
        }

        let state = Arc::new(replay()?);
        let mut entries = self.entries.write();
        let stored = Arc::clone(entries.entry((test, hart, target)).or_insert(state));
        metrics::record_cache_size(entries.len());
        drop(entries);
        Ok(stored)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
