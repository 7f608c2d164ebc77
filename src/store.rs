//! Primary club table.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::club::{Club, NewClub};
use crate::error::{ClubsError, ClubsResult};
use crate::index::{IndexChange, IndexEvent};
use crate::validation::RequestValidator;

#[derive(Default)]
struct Table {
    next_row: u64,
    rows: BTreeMap<u64, Club>,
    ids: HashMap<String, u64>,
    published: u64,
}

impl Table {
    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.ids.contains_key(&id) {
                return id;
            }
        }
    }
}

/// Insertion-ordered record table. Every mutation publishes an index event
/// while the table lock is held, so events arrive in mutation order.
pub struct ClubStore {
    table: RwLock<Table>,
    events: mpsc::UnboundedSender<IndexEvent>,
}

impl ClubStore {
    pub fn new(events: mpsc::UnboundedSender<IndexEvent>) -> Self {
        Self {
            table: RwLock::new(Table::default()),
            events,
        }
    }

    /// Stores a new club under a freshly generated id.
    pub fn put(&self, name: &str, nation: &str) -> ClubsResult<Club> {
        let new = NewClub::new(name, nation);
        RequestValidator::validate_new_club(&new)?;

        let mut table = self.table.write()
            .map_err(|_| ClubsError::Internal("Failed to acquire write lock on table".to_string()))?;

        let club = Club {
            id: table.fresh_id(),
            name: new.name,
            nation: new.nation,
        };

        let row = table.next_row;
        table.next_row += 1;
        table.ids.insert(club.id.clone(), row);
        table.rows.insert(row, club.clone());

        self.publish(&mut table, IndexChange::Insert {
            id: club.id.clone(),
            nation: club.nation.clone(),
        });

        tracing::debug!(id = %club.id, nation = %club.nation, "Stored club");
        Ok(club)
    }

    /// Removes the club if present. Deleting an absent id is not an error.
    pub fn delete(&self, id: &str) -> ClubsResult<Option<Club>> {
        let mut table = self.table.write()
            .map_err(|_| ClubsError::Internal("Failed to acquire write lock on table".to_string()))?;

        let Some(row) = table.ids.remove(id) else {
            return Ok(None);
        };
        let removed = table.rows.remove(&row);

        if let Some(club) = &removed {
            self.publish(&mut table, IndexChange::Remove {
                id: club.id.clone(),
                nation: club.nation.clone(),
            });
            tracing::debug!(id = %club.id, "Deleted club");
        }

        Ok(removed)
    }

    pub fn get_by_id(&self, id: &str) -> ClubsResult<Option<Club>> {
        let table = self.read()?;
        Ok(table
            .ids
            .get(id)
            .and_then(|row| table.rows.get(row))
            .cloned())
    }

    /// Every live club in insertion order.
    pub fn get_all(&self) -> ClubsResult<Vec<Club>> {
        Ok(self.read()?.rows.values().cloned().collect())
    }

    /// The live clubs among `ids`, in insertion order. Unknown ids are skipped.
    pub fn get_many(&self, ids: &HashSet<String>) -> ClubsResult<Vec<Club>> {
        let table = self.read()?;
        let mut rows: Vec<u64> = ids.iter().filter_map(|id| table.ids.get(id).copied()).collect();
        rows.sort_unstable();
        Ok(rows
            .into_iter()
            .filter_map(|row| table.rows.get(&row).cloned())
            .collect())
    }

    pub fn len(&self) -> usize {
        self.read().map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of index events published so far.
    pub fn published(&self) -> u64 {
        self.read().map(|t| t.published).unwrap_or(0)
    }

    fn read(&self) -> ClubsResult<std::sync::RwLockReadGuard<'_, Table>> {
        self.table.read()
            .map_err(|_| ClubsError::Internal("Failed to acquire read lock on table".to_string()))
    }

    fn publish(&self, table: &mut Table, change: IndexChange) {
        table.published += 1;
        let event = IndexEvent {
            seq: table.published,
            change,
            issued_at: Instant::now(),
        };
        if self.events.send(event).is_err() {
            tracing::warn!(seq = table.published, "Index worker is gone, index event dropped");
        }
    }
}
