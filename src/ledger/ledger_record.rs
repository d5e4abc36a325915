#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerRecord {
    pub identifier: String,
    pub applied: bool,
}

impl LedgerRecord {
    pub fn new<S: Into<String>>(identifier: S, applied: bool) -> Self {
        Self {
            identifier: identifier.into(),
            applied,
        }
    }

    pub fn pending<S: Into<String>>(identifier: S) -> Self {
        Self::new(identifier, false)
    }
}
