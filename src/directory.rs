use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::club::Club;
use crate::error::ClubsResult;
use crate::index::{IndexWorker, NationIndex};
use crate::store::ClubStore;

/// The club table, its nation index and the worker that keeps the index
/// current. Created at service start; [`Directory::shutdown`] stops the
/// worker once the queued index events are drained.
pub struct Directory {
    store: ClubStore,
    index: Arc<NationIndex>,
    worker: JoinHandle<()>,
}

impl Directory {
    /// Must be called from within a tokio runtime.
    pub fn start(index_lag: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let index = Arc::new(NationIndex::new());
        let worker = IndexWorker::new(Arc::clone(&index), rx, index_lag).spawn();

        Self {
            store: ClubStore::new(tx),
            index,
            worker,
        }
    }

    pub fn create(&self, name: &str, nation: &str) -> ClubsResult<Club> {
        self.store.put(name, nation)
    }

    pub fn list(&self) -> ClubsResult<Vec<Club>> {
        self.store.get_all()
    }

    pub fn get(&self, id: &str) -> ClubsResult<Option<Club>> {
        self.store.get_by_id(id)
    }

    pub fn delete(&self, id: &str) -> ClubsResult<Option<Club>> {
        self.store.delete(id)
    }

    /// Ids currently indexed under `nation`. May lag recent writes.
    pub fn nation_ids(&self, nation: &str) -> ClubsResult<HashSet<String>> {
        self.index.query(nation)
    }

    /// Clubs currently indexed under `nation`, in insertion order.
    ///
    /// Index ids are resolved through the table, so a club deleted before its
    /// removal reached the index is not returned. A recently created club may
    /// be missing until the index catches up.
    pub fn by_nation(&self, nation: &str) -> ClubsResult<Vec<Club>> {
        let ids = self.index.query(nation)?;
        self.store.get_many(&ids)
    }

    /// Waits until the index reflects every write made before this call.
    pub async fn settled(&self) {
        self.index.settled(self.store.published()).await;
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn index_pending(&self) -> u64 {
        self.index.pending(self.store.published())
    }

    pub async fn shutdown(self) {
        let Directory { store, index, worker } = self;
        let pending = index.pending(store.published());
        drop(store);

        if let Err(e) = worker.await {
            tracing::error!(error = %e, "Index worker panicked");
        }
        tracing::info!(drained = pending, nations = index.nations(), "Directory shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let directory = Directory::start(Duration::ZERO);
        let club = directory.create("Real Madrid", "Spain").unwrap();

        let all = directory.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Real Madrid");
        assert_eq!(all[0].nation, "Spain");
        assert!(!all[0].id.is_empty());
        assert_eq!(directory.get(&club.id).unwrap(), Some(club));
    }

    #[tokio::test]
    async fn test_index_matches_live_records_once_settled() {
        let directory = Directory::start(Duration::from_millis(5));
        let ajax = directory.create("Ajax", "Netherlands").unwrap();
        let psv = directory.create("PSV", "Netherlands").unwrap();
        let roma = directory.create("Roma", "Italy").unwrap();
        directory.delete(&psv.id).unwrap();

        directory.settled().await;
        assert_eq!(directory.index_pending(), 0);

        for nation in ["Netherlands", "Italy", "Spain"] {
            let expected: HashSet<String> = directory
                .list()
                .unwrap()
                .into_iter()
                .filter(|c| c.nation == nation)
                .map(|c| c.id)
                .collect();
            assert_eq!(directory.nation_ids(nation).unwrap(), expected);
        }
        assert_eq!(directory.by_nation("Netherlands").unwrap(), vec![ajax]);
        assert_eq!(directory.by_nation("Italy").unwrap(), vec![roma]);
    }

    #[tokio::test]
    async fn test_scenario_with_staleness_window() {
        let lag = Duration::from_millis(100);
        let directory = Directory::start(lag);

        let ajax = directory.create("Ajax", "Netherlands").unwrap();
        // Primary path sees the write at once; the index has not caught up.
        assert_eq!(directory.list().unwrap().len(), 1);
        assert!(directory.nation_ids("Netherlands").unwrap().is_empty());

        directory.settled().await;
        assert_eq!(
            directory.nation_ids("Netherlands").unwrap(),
            HashSet::from([ajax.id.clone()])
        );

        directory.delete(&ajax.id).unwrap();
        assert!(directory.list().unwrap().is_empty());
        // Stale index entry, but the resolved view already drops the record.
        assert!(directory.nation_ids("Netherlands").unwrap().contains(&ajax.id));
        assert!(directory.by_nation("Netherlands").unwrap().is_empty());

        directory.settled().await;
        assert!(directory.nation_ids("Netherlands").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_drains_index() {
        let directory = Directory::start(Duration::ZERO);
        directory.create("Ajax", "Netherlands").unwrap();
        let index = Arc::clone(&directory.index);

        directory.shutdown().await;
        assert_eq!(index.applied(), 1);
        assert_eq!(index.query("Netherlands").unwrap().len(), 1);
    }
}
