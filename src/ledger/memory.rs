use crate::ledger::{LedgerRecord, LedgerStore};
use crate::sync::Mutex;
use crate::{AsyncResult, Error};
use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-local ledger.
///
/// Clones share the same records, so a clone can be handed to a `Migrator`
/// while the original is kept for inspection.
#[derive(Clone, Debug, Default)]
pub struct MemoryLedgerStore {
    records: Arc<Mutex<Vec<LedgerRecord>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `records`.
    pub fn with_records(records: Vec<LedgerRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn records(&self) -> Vec<LedgerRecord> {
        self.records.lock().await.clone()
    }

    /// Number of write operations (batch inserts and status updates) issued so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn fetch_all(&self) -> AsyncResult<'_, Vec<LedgerRecord>> {
        Box::pin(async move { Ok(self.records().await) })
    }

    fn insert_many(&self, records: Vec<LedgerRecord>) -> AsyncResult<'_, ()> {
        Box::pin(async move {
            let mut guard = self.records.lock().await;
            debug!(target: "stepwise::ledger", "Inserting {} ledger records", records.len());

            self.writes.fetch_add(1, Ordering::SeqCst);
            guard.extend(records);

            Ok(())
        })
    }

    fn set_applied<'a>(&'a self, identifier: &'a str, applied: bool) -> AsyncResult<'a, ()> {
        Box::pin(async move {
            let mut guard = self.records.lock().await;
            let record = guard
                .iter_mut()
                .find(|record| record.identifier == identifier)
                .ok_or_else(|| Error::record_not_found(identifier))?;

            self.writes.fetch_add(1, Ordering::SeqCst);
            record.applied = applied;

            Ok(())
        })
    }
}
