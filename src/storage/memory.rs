//! In-process table store.
//!
//! Holds the table map behind an `Arc` and swaps in a new copy on every
//! write, so readers clone a consistent snapshot without waiting on writers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::{StorageError, TableStore};
use crate::models::{Table, TableKind};

type TableMap = HashMap<TableKind, Arc<Table>>;

#[derive(Debug, Default)]
pub struct MemoryTableStore {
    tables: RwLock<Arc<TableMap>>,
    version: AtomicU64,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed writes. Bumped once per `write_table`/`write_tables`.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    fn snapshot(&self) -> Arc<TableMap> {
        match self.tables.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn swap<F: FnOnce(&mut TableMap)>(&self, update: F) {
        let mut guard = match self.tables.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut next = TableMap::clone(&guard);
        update(&mut next);
        *guard = Arc::new(next);
        self.version.fetch_add(1, Ordering::AcqRel);
    }
}

impl TableStore for MemoryTableStore {
    fn read_table(&self, kind: TableKind) -> Result<Table, StorageError> {
        self.snapshot()
            .get(&kind)
            .map(|t| Table::clone(t))
            .ok_or(StorageError::TableMissing(kind))
    }

    fn write_table(&self, kind: TableKind, table: &Table) -> Result<(), StorageError> {
        let table = Arc::new(table.clone());
        self.swap(|map| {
            map.insert(kind, table);
        });
        Ok(())
    }

    /// Swaps the whole batch in at once.
    fn write_tables(&self, tables: &[(TableKind, Table)]) -> Result<(), StorageError> {
        let batch: Vec<(TableKind, Arc<Table>)> = tables
            .iter()
            .map(|(kind, table)| (*kind, Arc::new(table.clone())))
            .collect();
        self.swap(|map| map.extend(batch));
        Ok(())
    }
}
