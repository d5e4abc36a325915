use crate::ledger::{LedgerRecord, LedgerStore};
use crate::{Error, Result};
use itertools::Itertools;
use log::{debug, info};
use std::ops::Deref;

/// Ledger records aligned 1:1, by position, with the sorted migrations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReconciledList {
    records: Vec<LedgerRecord>,
}

impl ReconciledList {
    pub(crate) fn new(records: Vec<LedgerRecord>) -> Self {
        Self { records }
    }

    pub(crate) fn set_applied(&mut self, position: usize, applied: bool) {
        if let Some(record) = self.records.get_mut(position) {
            record.applied = applied;
        }
    }

    pub fn into_inner(self) -> Vec<LedgerRecord> {
        self.records
    }
}

impl Deref for ReconciledList {
    type Target = [LedgerRecord];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

/// Aligns the ledger with the defined migration identifiers.
///
/// Identifiers are sorted before comparison. Records already in the ledger
/// must match the sorted identifiers position by position; identifiers past
/// the recorded ones are inserted as pending, in a single batch.
/// Running it again with the same identifiers issues no write.
pub async fn reconcile<S: AsRef<str>>(
    identifiers: &[S],
    store: &dyn LedgerStore,
) -> Result<ReconciledList> {
    let mut identifiers = identifiers
        .iter()
        .map(|identifier| identifier.as_ref())
        .collect::<Vec<&str>>();
    identifiers.sort_unstable();

    if let Some((duplicate, _)) = identifiers
        .iter()
        .tuple_windows()
        .find(|(a, b)| a == b)
    {
        return Err(Error::duplicate_migration(duplicate));
    }

    let mut records = store.fetch_all().await.map_err(Error::ledger_read)?;
    records.sort_by(|a, b| a.identifier.cmp(&b.identifier));

    if records.len() > identifiers.len() {
        return Err(Error::deleted_migration(records.len(), identifiers.len()));
    }

    for (position, (record, identifier)) in records.iter().zip(identifiers.iter()).enumerate() {
        if record.identifier.as_str() != *identifier {
            return Err(Error::history_mismatch(
                position,
                &record.identifier,
                identifier,
            ));
        }
    }

    let to_insert = identifiers[records.len()..]
        .iter()
        .map(|identifier| LedgerRecord::pending(*identifier))
        .collect::<Vec<_>>();

    if to_insert.is_empty() {
        debug!(target: "stepwise::migrate", "Ledger is up to date with {} migrations", records.len());
    } else {
        info!(target: "stepwise::migrate", "Recording {} new migrations", to_insert.len());
        store
            .insert_many(to_insert.clone())
            .await
            .map_err(Error::ledger_write)?;
        records.extend(to_insert);
    }

    Ok(ReconciledList::new(records))
}

#[cfg(test)]
mod tests {
    use super::reconcile;
    use crate::error::ErrorKind;
    use crate::ledger::{LedgerRecord, MemoryLedgerStore};

    #[tokio::test]
    async fn fresh_ledger_gets_pending_records() {
        let store = MemoryLedgerStore::new();
        let list = reconcile(&["b", "a", "c"], &store).await.unwrap();

        assert_eq!(
            list.into_inner(),
            vec![
                LedgerRecord::pending("a"),
                LedgerRecord::pending("b"),
                LedgerRecord::pending("c"),
            ]
        );
        assert_eq!(store.records().await.len(), 3);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn reconciliation_is_idempotent() {
        let store = MemoryLedgerStore::with_records(vec![LedgerRecord::new("a", true)]);

        let first = reconcile(&["a", "b"], &store).await.unwrap();
        let writes = store.write_count();
        let second = reconcile(&["a", "b"], &store).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn list_is_aligned_with_sorted_identifiers() {
        let store = MemoryLedgerStore::with_records(vec![
            LedgerRecord::new("001_a", true),
            LedgerRecord::new("002_b", false),
        ]);

        let identifiers = ["003_c", "001_a", "004_d", "002_b"];
        let list = reconcile(&identifiers, &store).await.unwrap();

        let mut sorted = identifiers.to_vec();
        sorted.sort();
        assert_eq!(list.len(), sorted.len());
        for (record, identifier) in list.iter().zip(sorted) {
            assert_eq!(record.identifier, identifier);
        }

        // recorded statuses are preserved
        assert!(list[0].applied);
        assert!(!list[1].applied);
    }

    #[tokio::test]
    async fn ledger_records_are_sorted_before_comparison() {
        let store = MemoryLedgerStore::with_records(vec![
            LedgerRecord::new("b", true),
            LedgerRecord::new("a", true),
        ]);

        let list = reconcile(&["a", "b"], &store).await.unwrap();
        assert_eq!(list[0].identifier, "a");
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn detects_deleted_migrations() {
        let store = MemoryLedgerStore::with_records(vec![
            LedgerRecord::new("a", true),
            LedgerRecord::new("b", true),
            LedgerRecord::new("c", false),
        ]);

        let error = reconcile(&["a", "b"], &store).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DeletedMigration);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn detects_history_mismatch() {
        let store = MemoryLedgerStore::with_records(vec![
            LedgerRecord::new("a", true),
            LedgerRecord::new("c", true),
        ]);

        let error = reconcile(&["a", "b", "c"], &store).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::HistoryMismatch);
        assert_eq!(error.identifier(), Some("c"));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn detects_duplicate_identifiers() {
        let store = MemoryLedgerStore::new();

        let error = reconcile(&["a", "b", "a"], &store).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DuplicateMigration);
        assert_eq!(error.identifier(), Some("a"));
        assert!(store.records().await.is_empty());
    }

    #[tokio::test]
    async fn empty_definitions_with_empty_ledger() {
        let store = MemoryLedgerStore::new();
        let identifiers: [&str; 0] = [];

        let list = reconcile(&identifiers, &store).await.unwrap();
        assert!(list.is_empty());
        assert_eq!(store.write_count(), 0);
    }
}
