use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::trace;

use crate::types::{ProbeOutcome, ResultSet};

/// Append-only accumulator shared by every probe task of one scan.
///
/// Clones share the same storage, so a handle can move into each pool task.
#[derive(Clone, Debug, Default)]
pub struct ResultCollector {
    probed: Arc<AtomicU64>,
    entries: Arc<Mutex<Vec<ProbeOutcome>>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one attempted probe.
    pub fn record_probe(&self) {
        self.probed.fetch_add(1, Ordering::Relaxed);
    }

    /// Store an outcome. Outcomes that are not open are dropped.
    pub async fn append(&self, outcome: ProbeOutcome) {
        if !outcome.open {
            return;
        }
        trace!(addr = %outcome.target, "collected");
        self.entries.lock().await.push(outcome);
    }

    pub fn probed(&self) -> u64 {
        self.probed.load(Ordering::Relaxed)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Consume this handle and return the collected results.
    ///
    /// Other handles still alive keep their access; the entries are cloned out
    /// in that case.
    pub async fn freeze(self) -> ResultSet {
        let probed = self.probed();
        let entries = match Arc::try_unwrap(self.entries) {
            Ok(mutex) => mutex.into_inner(),
            Err(shared) => shared.lock().await.clone(),
        };
        ResultSet { probed, entries }
    }
}
