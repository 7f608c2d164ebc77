//! Nation index.
//!
//! A derived mapping from nation to the ids of the clubs in that nation. The
//! index is maintained asynchronously: the store publishes an [`IndexEvent`]
//! for every mutation and an [`IndexWorker`] applies them in order. A write is
//! visible on the primary path as soon as `put`/`delete` returns, but becomes
//! visible here only after the configured propagation lag plus worker
//! scheduling time. Callers that need the index to reflect a given write can
//! wait on [`NationIndex::settled`].

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{ClubsError, ClubsResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexChange {
    Insert { id: String, nation: String },
    Remove { id: String, nation: String },
}

#[derive(Debug, Clone)]
pub struct IndexEvent {
    /// 1-based position in the store's mutation order
    pub seq: u64,
    pub change: IndexChange,
    pub issued_at: Instant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Progress {
    applied: u64,
    stopped: bool,
}

pub struct NationIndex {
    buckets: RwLock<HashMap<String, HashSet<String>>>,
    progress: watch::Sender<Progress>,
}

impl Default for NationIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl NationIndex {
    pub fn new() -> Self {
        let (progress, _) = watch::channel(Progress::default());
        Self {
            buckets: RwLock::new(HashMap::new()),
            progress,
        }
    }

    /// Registers `id` under `nation`.
    pub fn index(&self, id: &str, nation: &str) -> ClubsResult<()> {
        let mut buckets = self.buckets.write()
            .map_err(|_| ClubsError::Internal("Failed to acquire write lock on index".to_string()))?;
        buckets
            .entry(nation.to_string())
            .or_default()
            .insert(id.to_string());
        Ok(())
    }

    /// Removes `id` from `nation`; a no-op if it is not there.
    pub fn deindex(&self, id: &str, nation: &str) -> ClubsResult<()> {
        let mut buckets = self.buckets.write()
            .map_err(|_| ClubsError::Internal("Failed to acquire write lock on index".to_string()))?;
        if let Some(ids) = buckets.get_mut(nation) {
            ids.remove(id);
            if ids.is_empty() {
                buckets.remove(nation);
            }
        }
        Ok(())
    }

    pub fn query(&self, nation: &str) -> ClubsResult<HashSet<String>> {
        let buckets = self.buckets.read()
            .map_err(|_| ClubsError::Internal("Failed to acquire read lock on index".to_string()))?;
        Ok(buckets.get(nation).cloned().unwrap_or_default())
    }

    pub fn nations(&self) -> usize {
        self.buckets.read().map(|b| b.len()).unwrap_or(0)
    }

    /// Sequence number of the last applied event.
    pub fn applied(&self) -> u64 {
        self.progress.borrow().applied
    }

    /// Number of events published but not yet applied.
    pub fn pending(&self, published: u64) -> u64 {
        published.saturating_sub(self.applied())
    }

    /// Resolves once every event up to `through` has been applied, or the
    /// worker has stopped.
    pub async fn settled(&self, through: u64) {
        let mut rx = self.progress.subscribe();
        let _ = rx
            .wait_for(|p| p.applied >= through || p.stopped)
            .await;
    }

    fn apply(&self, event: &IndexEvent) -> ClubsResult<()> {
        match &event.change {
            IndexChange::Insert { id, nation } => self.index(id, nation)?,
            IndexChange::Remove { id, nation } => self.deindex(id, nation)?,
        }
        self.progress.send_modify(|p| p.applied = p.applied.max(event.seq));
        Ok(())
    }

    fn mark_stopped(&self) {
        self.progress.send_modify(|p| p.stopped = true);
    }
}

/// Applies store events to a [`NationIndex`] in publication order.
pub struct IndexWorker {
    index: Arc<NationIndex>,
    events: mpsc::UnboundedReceiver<IndexEvent>,
    lag: Duration,
}

impl IndexWorker {
    pub fn new(
        index: Arc<NationIndex>,
        events: mpsc::UnboundedReceiver<IndexEvent>,
        lag: Duration,
    ) -> Self {
        Self { index, events, lag }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until every sender is dropped and the queue is drained.
    pub async fn run(mut self) {
        tracing::debug!(lag_ms = self.lag.as_millis() as u64, "Index worker started");

        while let Some(event) = self.events.recv().await {
            if !self.lag.is_zero() {
                tokio::time::sleep_until(event.issued_at + self.lag).await;
            }

            if let Err(e) = self.index.apply(&event) {
                tracing::error!(seq = event.seq, error = %e, "Failed to apply index event");
            }
        }

        self.index.mark_stopped();
        tracing::debug!("Index worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(seq: u64, change: IndexChange) -> IndexEvent {
        IndexEvent {
            seq,
            change,
            issued_at: Instant::now(),
        }
    }

    fn insert(id: &str, nation: &str) -> IndexChange {
        IndexChange::Insert {
            id: id.to_string(),
            nation: nation.to_string(),
        }
    }

    #[test]
    fn test_index_and_query() {
        let index = NationIndex::new();
        index.index("1", "Spain").unwrap();
        index.index("2", "Spain").unwrap();
        index.index("3", "Italy").unwrap();

        let spain = index.query("Spain").unwrap();
        assert_eq!(spain.len(), 2);
        assert!(spain.contains("1") && spain.contains("2"));
        assert!(index.query("France").unwrap().is_empty());
    }

    #[test]
    fn test_deindex_is_noop_when_absent() {
        let index = NationIndex::new();
        index.deindex("1", "Spain").unwrap();
        index.index("1", "Spain").unwrap();
        index.deindex("1", "Spain").unwrap();
        index.deindex("1", "Spain").unwrap();
        assert!(index.query("Spain").unwrap().is_empty());
        assert_eq!(index.nations(), 0);
    }

    #[tokio::test]
    async fn test_worker_applies_in_order() {
        let index = Arc::new(NationIndex::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = IndexWorker::new(Arc::clone(&index), rx, Duration::ZERO).spawn();

        tx.send(event(1, insert("a", "Spain"))).unwrap();
        tx.send(event(2, IndexChange::Remove {
            id: "a".to_string(),
            nation: "Spain".to_string(),
        }))
        .unwrap();
        tx.send(event(3, insert("b", "Spain"))).unwrap();

        index.settled(3).await;
        assert_eq!(index.applied(), 3);
        assert_eq!(index.pending(3), 0);
        let spain = index.query("Spain").unwrap();
        assert_eq!(spain, HashSet::from(["b".to_string()]));

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_lag_delays_visibility() {
        let lag = Duration::from_millis(150);
        let index = Arc::new(NationIndex::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let _handle = IndexWorker::new(Arc::clone(&index), rx, lag).spawn();

        let started = Instant::now();
        tx.send(event(1, insert("a", "Netherlands"))).unwrap();
        assert!(index.query("Netherlands").unwrap().is_empty());
        assert_eq!(index.pending(1), 1);

        index.settled(1).await;
        assert!(started.elapsed() >= lag);
        assert!(index.query("Netherlands").unwrap().contains("a"));
    }

    #[tokio::test]
    async fn test_settled_returns_when_worker_stops() {
        let index = Arc::new(NationIndex::new());
        let (tx, rx) = mpsc::unbounded_channel::<IndexEvent>();
        let handle = IndexWorker::new(Arc::clone(&index), rx, Duration::ZERO).spawn();
        drop(tx);
        handle.await.unwrap();

        // Nothing will ever reach seq 10, but a stopped worker must not hang callers.
        index.settled(10).await;
        assert_eq!(index.applied(), 0);
    }
}
