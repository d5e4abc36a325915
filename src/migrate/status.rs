use crate::ledger::LedgerRecord;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusEntry {
    pub identifier: String,
    pub applied: bool,
}

impl From<&LedgerRecord> for StatusEntry {
    fn from(record: &LedgerRecord) -> Self {
        Self {
            identifier: record.identifier.clone(),
            applied: record.applied,
        }
    }
}

impl Display for StatusEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}",
            if self.applied { "✔" } else { "✘" },
            self.identifier
        )
    }
}

/// Renders one entry per line, in list order.
pub fn render_status(entries: &[StatusEntry]) -> String {
    entries.iter().join("\n")
}
