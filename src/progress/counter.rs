//! Shared byte total.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Running total of body bytes read by every worker of a run.
///
/// Cloning hands out another handle to the same total. Increments are
/// lock-free; a snapshot is a sequentially consistent load, so two snapshots
/// taken one after the other never go backwards.
#[derive(Debug, Clone, Default)]
pub struct ByteCounter {
    total: Arc<AtomicU64>,
}

impl ByteCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` bytes to the total.
    pub fn add(&self, n: u64) {
        self.total.fetch_add(n, Ordering::Relaxed);
    }

    /// Current total.
    pub fn snapshot(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }
}
