use crate::connection::Session;
use crate::driver::statement::Statement;
use crate::ledger::{LedgerRecord, LedgerStore};
use crate::{AsyncResult, Connection, Error, Result, Value};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};

/// Ledger kept in a table of the target database.
///
/// Every operation opens its own session and closes it before returning.
pub struct TableLedgerStore<'conn> {
    connection: &'conn Connection,
    is_initialized: AtomicBool,
    table_name: String,
    identifier_column_name: String,
    applied_column_name: String,
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl<'conn> TableLedgerStore<'conn> {
    pub fn new(connection: &'conn Connection) -> Self {
        let configuration = connection.get_configuration();
        Self {
            connection,
            is_initialized: AtomicBool::new(false),
            table_name: configuration.get_ledger_table_name().to_string(),
            identifier_column_name: configuration.get_identifier_column_name().to_string(),
            applied_column_name: configuration.get_applied_column_name().to_string(),
        }
    }

    pub fn with_table_name(mut self, table_name: &str) -> Self {
        self.table_name = table_name.to_string();
        self
    }

    pub fn get_table_name(&self) -> &str {
        &self.table_name
    }

    async fn is_initialized(&self, session: &Session) -> Result<bool> {
        if self.is_initialized.load(Ordering::SeqCst) {
            return Ok(true);
        }

        let exists = session.table_exists(&self.table_name).await?;
        self.is_initialized.store(exists, Ordering::SeqCst);

        Ok(exists)
    }

    async fn ensure_initialized(&self, session: &Session) -> Result<()> {
        if self.is_initialized(session).await? {
            return Ok(());
        }

        debug!(target: "stepwise::ledger", "Creating ledger table {}", self.table_name);
        session
            .execute_statement(&self.get_create_table_sql(), vec![])
            .await?;
        self.is_initialized.store(true, Ordering::SeqCst);

        Ok(())
    }

    fn get_create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({} VARCHAR(255) NOT NULL PRIMARY KEY, {} BOOLEAN NOT NULL)",
            quote_identifier(&self.table_name),
            quote_identifier(&self.identifier_column_name),
            quote_identifier(&self.applied_column_name),
        )
    }

    async fn fetch_records(&self, session: &Session) -> Result<Vec<LedgerRecord>> {
        if !self.is_initialized(session).await? {
            return Ok(vec![]);
        }

        let rows = session
            .query(
                &format!(
                    "SELECT {identifier}, {applied} FROM {table} ORDER BY {identifier}",
                    identifier = quote_identifier(&self.identifier_column_name),
                    applied = quote_identifier(&self.applied_column_name),
                    table = quote_identifier(&self.table_name),
                ),
                vec![],
            )
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let identifier = row.get(self.identifier_column_name.as_str())?;
            let applied = row.get(self.applied_column_name.as_str())?;

            records.push(LedgerRecord {
                identifier: identifier
                    .as_str()
                    .ok_or_else(|| Error::from(format!("invalid ledger identifier {}", identifier)))?
                    .to_string(),
                applied: applied
                    .as_bool()
                    .ok_or_else(|| Error::from(format!("invalid ledger status {}", applied)))?,
            });
        }

        Ok(records)
    }

    async fn insert_records(&self, session: &Session, records: Vec<LedgerRecord>) -> Result<()> {
        self.ensure_initialized(session).await?;

        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES ({}, {})",
            quote_identifier(&self.table_name),
            quote_identifier(&self.identifier_column_name),
            quote_identifier(&self.applied_column_name),
            session.placeholder(1),
            session.placeholder(2),
        );

        let statements = records
            .into_iter()
            .map(|record| {
                Statement::new(
                    sql.clone(),
                    vec![
                        Value::String(record.identifier),
                        Value::Boolean(record.applied),
                    ],
                )
            })
            .collect::<Vec<_>>();

        debug!(target: "stepwise::ledger", "Inserting {} ledger records", statements.len());
        session.execute_transactional(statements).await?;

        Ok(())
    }

    async fn update_record(&self, session: &Session, identifier: &str, applied: bool) -> Result<()> {
        self.ensure_initialized(session).await?;

        let sql = format!(
            "UPDATE {} SET {} = {} WHERE {} = {}",
            quote_identifier(&self.table_name),
            quote_identifier(&self.applied_column_name),
            session.placeholder(1),
            quote_identifier(&self.identifier_column_name),
            session.placeholder(2),
        );

        let affected = session
            .execute_statement(&sql, vec![Value::Boolean(applied), Value::from(identifier)])
            .await?;

        if affected == 0 {
            Err(Error::record_not_found(identifier))
        } else {
            Ok(())
        }
    }
}

impl LedgerStore for TableLedgerStore<'_> {
    fn fetch_all(&self) -> AsyncResult<'_, Vec<LedgerRecord>> {
        Box::pin(async move {
            let session = self.connection.open().await?;
            let result = self.fetch_records(&session).await;
            session.close().await;

            result
        })
    }

    fn insert_many(&self, records: Vec<LedgerRecord>) -> AsyncResult<'_, ()> {
        Box::pin(async move {
            let session = self.connection.open().await?;
            let result = self.insert_records(&session, records).await;
            session.close().await;

            result
        })
    }

    fn set_applied<'a>(&'a self, identifier: &'a str, applied: bool) -> AsyncResult<'a, ()> {
        Box::pin(async move {
            let session = self.connection.open().await?;
            let result = self.update_record(&session, identifier, applied).await;
            session.close().await;

            result
        })
    }
}
