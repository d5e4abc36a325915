use crate::driver::statement::Statement;
use crate::error::ErrorKind;
use crate::migrate::Direction;
use crate::migrate::execution_result::ExecutionResult;
use crate::migrate::migration_plan::MigrationPlan;
use crate::{Connection, ConnectionOptions, Result};
use log::info;
use std::fmt::Display;

/// Handed to migration operations to queue the SQL they need executed.
///
/// Queued statements run in a single transaction once the operation returns
/// successfully.
pub struct Executor<'conn> {
    connection: &'conn Connection,
    sql: Vec<String>,
}

impl<'conn> Executor<'conn> {
    pub fn new(connection: &'conn Connection) -> Self {
        Self {
            connection,
            sql: vec![],
        }
    }

    pub fn get_connection_options(&self) -> &ConnectionOptions {
        self.connection.get_connection_options()
    }

    pub fn add_sql(&mut self, sql: impl Display) {
        self.sql.push(sql.to_string());
    }

    async fn run_sql(&self) -> Result<()> {
        let session = self.connection.open().await?;
        let statements = self
            .sql
            .iter()
            .map(|sql| Statement::from(sql.as_str()))
            .collect::<Vec<_>>();

        let result = session.execute_transactional(statements).await;
        session.close().await;

        result.map(|_| ())
    }

    /// Runs the operation of the planned migration.
    pub(super) async fn execute(&mut self, migration: &MigrationPlan) -> ExecutionResult {
        let description = migration
            .migration
            .description
            .map(|description| format!(" ({})", description()))
            .unwrap_or_default();

        info!(target: "stepwise::migrate", "++ {} {}{}", if migration.direction == Direction::Up {
            "migrating"
        } else {
            "reverting"
        }, migration.identifier(), description);

        let func = if migration.direction == Direction::Up {
            migration.migration.up
        } else {
            migration.migration.down
        };

        self.sql.clear();
        let mut skipped = false;
        let mut error = None;

        let start = chrono::Utc::now();
        match func(self) {
            Ok(_) => (),
            Err(e) if e.kind() == ErrorKind::SkipMigration => {
                skipped = true;
                self.sql.clear();
            }
            Err(e) => {
                let _ = error.insert(e);
            }
        };

        if error.is_none() && !self.sql.is_empty() {
            if let Err(e) = self.run_sql().await {
                let _ = error.insert(e);
            }
        }

        let diff = chrono::Utc::now() - start;

        let sql_count = if error.is_none() { self.sql.len() } else { 0 };
        self.sql.clear();

        ExecutionResult {
            execution_time: diff.num_milliseconds(),
            sql_count,
            skipped,
            error,
        }
    }
}
