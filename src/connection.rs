use crate::driver::Driver;
use crate::driver::statement::Statement;
use crate::sync::Mutex;
use crate::{Configuration, ConnectionOptions, Result, Row, Value};
use log::{debug, warn};
use std::sync::Arc;

/// Connection target for the ledger and the migrated database.
///
/// A `Connection` does not keep a session open: every logical operation
/// calls [`Connection::open`] and closes the returned [`Session`] when done.
/// In-memory SQLite databases are the only exception, as their content would
/// vanish with the session: the first session is kept alive and shared.
#[derive(Debug)]
pub struct Connection {
    connection_options: ConnectionOptions,
    configuration: Configuration,
    shared_driver: Mutex<Option<Arc<Driver>>>,
}

impl Connection {
    pub fn create(
        connection_options: ConnectionOptions,
        configuration: Option<Configuration>,
    ) -> Self {
        Self {
            connection_options,
            configuration: configuration.unwrap_or_default(),
            shared_driver: Mutex::new(None),
        }
    }

    pub fn create_from_dsn(dsn: &str, configuration: Option<Configuration>) -> Result<Self> {
        Ok(Self::create(ConnectionOptions::try_from(dsn)?, configuration))
    }

    pub fn get_configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn get_connection_options(&self) -> &ConnectionOptions {
        &self.connection_options
    }

    /// Opens a new session against the target database.
    pub async fn open(&self) -> Result<Session> {
        if !self.connection_options.is_ephemeral() {
            let driver = Driver::create(&self.connection_options).await?;
            return Ok(Session::new(Arc::new(driver)));
        }

        let mut guard = self.shared_driver.lock().await;
        if let Some(driver) = guard.as_ref() {
            return Ok(Session::new(driver.clone()));
        }

        let driver = Arc::new(Driver::create(&self.connection_options).await?);
        let _ = guard.insert(driver.clone());

        Ok(Session::new(driver))
    }
}

/// A scoped session over a driver connection.
///
/// The underlying connection is released when the session is dropped;
/// [`Session::close`] does the same but reports close failures in the log.
#[derive(Debug)]
pub struct Session {
    driver: Arc<Driver>,
}

impl Session {
    fn new(driver: Arc<Driver>) -> Self {
        Self { driver }
    }

    pub fn placeholder(&self, position: usize) -> String {
        self.driver.placeholder(position)
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        self.driver.table_exists(table_name).await
    }

    pub async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>> {
        debug!(target: "stepwise::connection", "{}", sql);
        self.driver.query(sql, params).await
    }

    pub async fn execute_statement(&self, sql: &str, params: Vec<Value>) -> Result<usize> {
        debug!(target: "stepwise::connection", "{}", sql);
        self.driver.execute_statement(sql, params).await
    }

    pub async fn execute_transactional(&self, statements: Vec<Statement>) -> Result<usize> {
        for statement in statements.iter() {
            debug!(target: "stepwise::connection", "{}", statement.sql);
        }

        self.driver.execute_transactional(statements).await
    }

    /// Closes the session. Failures are logged and never propagated.
    pub async fn close(self) {
        // shared in-memory drivers stay open
        if let Ok(driver) = Arc::try_unwrap(self.driver) {
            if let Err(e) = driver.close().await {
                warn!(target: "stepwise::connection", "Error while closing connection: {}", e);
            }
        }
    }
}
