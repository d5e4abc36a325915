use std::fmt::{Debug, Formatter};

/// Names of the ledger table and its columns.
#[derive(Clone)]
pub struct Configuration {
    ledger_table_name: String,
    identifier_column_name: String,
    applied_column_name: String,
}

impl Configuration {
    pub fn new() -> Self {
        Self {
            ledger_table_name: "migrations".to_string(),
            identifier_column_name: "migration".to_string(),
            applied_column_name: "applied".to_string(),
        }
    }

    pub fn with_ledger_table_name(mut self, table_name: &str) -> Self {
        self.ledger_table_name = table_name.to_string();
        self
    }

    pub fn with_identifier_column_name(mut self, column_name: &str) -> Self {
        self.identifier_column_name = column_name.to_string();
        self
    }

    pub fn with_applied_column_name(mut self, column_name: &str) -> Self {
        self.applied_column_name = column_name.to_string();
        self
    }

    pub fn get_ledger_table_name(&self) -> &str {
        &self.ledger_table_name
    }

    pub fn get_identifier_column_name(&self) -> &str {
        &self.identifier_column_name
    }

    pub fn get_applied_column_name(&self) -> &str {
        &self.applied_column_name
    }
}

impl Debug for Configuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("ledger_table_name", &self.ledger_table_name)
            .field("identifier_column_name", &self.identifier_column_name)
            .field("applied_column_name", &self.applied_column_name)
            .finish()
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration::new()
    }
}
