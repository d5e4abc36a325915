use crate::driver::statement::Statement;
use crate::{ConnectionOptions, Error, Result, Row, Value};
use connection::DriverConnection;
use std::fmt::{Debug, Formatter};

pub mod connection;
pub mod statement;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub struct Driver {
    inner_driver: Box<dyn DriverConnection>,
    scheme: String,
}

impl Driver {
    pub fn create_with_connection(scheme: &str, connection: Box<dyn DriverConnection>) -> Self {
        Self {
            inner_driver: connection,
            scheme: scheme.to_string(),
        }
    }

    pub async fn create(connection_options: &ConnectionOptions) -> Result<Self> {
        let scheme = connection_options
            .scheme
            .as_deref()
            .ok_or_else(|| Error::config("connection options have no scheme"))?;

        let driver = match scheme {
            #[cfg(feature = "postgres")]
            "postgres" => Box::new(postgres::driver::Driver::create(connection_options).await?)
                as Box<dyn DriverConnection>,
            #[cfg(feature = "sqlite")]
            "sqlite" => Box::new(sqlite::driver::Driver::create(connection_options)?)
                as Box<dyn DriverConnection>,
            proto => return Err(Error::unknown_driver(proto)),
        };

        Ok(Self::create_with_connection(scheme, driver))
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn placeholder(&self, position: usize) -> String {
        self.inner_driver.placeholder(position)
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        self.inner_driver.table_exists(table_name).await
    }

    /// Executes an SQL statement, returning all the fetched rows.
    pub async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>> {
        self.inner_driver.query(sql, params).await
    }

    pub async fn execute_statement(&self, sql: &str, params: Vec<Value>) -> Result<usize> {
        self.inner_driver.execute_statement(sql, params).await
    }

    pub async fn execute_transactional(&self, statements: Vec<Statement>) -> Result<usize> {
        self.inner_driver.execute_transactional(statements).await
    }

    pub async fn close(self) -> Result<()> {
        self.inner_driver.close().await
    }
}

impl Debug for Driver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("scheme", &self.scheme)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::driver::Driver;
    use crate::error::ErrorKind;
    use crate::ConnectionOptions;

    #[tokio::test]
    async fn unknown_scheme_is_rejected() {
        let options = ConnectionOptions::default().with_scheme(Some("oracle".to_string()));
        let error = Driver::create(&options).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnknownDriver);
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn can_create_sqlite_driver() {
        let options = ConnectionOptions::try_from("sqlite://:memory:").unwrap();
        let driver = Driver::create(&options).await.expect("Must be connected");
        assert_eq!(driver.scheme(), "sqlite");

        let rows = driver.query("SELECT 1", vec![]).await.expect("Query failed");
        assert_eq!(rows.len(), 1);
        driver.close().await.expect("Close failed");
    }
}
