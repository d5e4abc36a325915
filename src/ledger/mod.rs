mod ledger_record;
mod memory;
mod table;

use crate::AsyncResult;
pub use ledger_record::LedgerRecord;
pub use memory::MemoryLedgerStore;
use std::sync::Arc;
pub use table::TableLedgerStore;

/// Persistent record set tracking the applied status of every migration.
pub trait LedgerStore: Send + Sync {
    /// Returns every record, in insertion order.
    /// An uninitialized store yields an empty list.
    fn fetch_all(&self) -> AsyncResult<'_, Vec<LedgerRecord>>;

    /// Appends the given records. Duplicates are not filtered out.
    fn insert_many(&self, records: Vec<LedgerRecord>) -> AsyncResult<'_, ()>;

    /// Updates the status of exactly one record.
    /// Fails with a `RecordNotFound` error if no record matches `identifier`.
    fn set_applied<'a>(&'a self, identifier: &'a str, applied: bool) -> AsyncResult<'a, ()>;
}

impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    fn fetch_all(&self) -> AsyncResult<'_, Vec<LedgerRecord>> {
        self.as_ref().fetch_all()
    }

    fn insert_many(&self, records: Vec<LedgerRecord>) -> AsyncResult<'_, ()> {
        self.as_ref().insert_many(records)
    }

    fn set_applied<'a>(&'a self, identifier: &'a str, applied: bool) -> AsyncResult<'a, ()> {
        self.as_ref().set_applied(identifier, applied)
    }
}
