use crate::driver::connection::DriverConnection;
use crate::driver::statement::Statement;
use crate::{AsyncResult, ConnectionOptions, Error, Result, Row, Value};
use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};
use std::sync::{Mutex, MutexGuard};

pub struct Driver {
    connection: Mutex<rusqlite::Connection>,
}

impl Driver {
    pub fn create(options: &ConnectionOptions) -> Result<Self> {
        let connection = if options.memory {
            rusqlite::Connection::open_in_memory()
        } else {
            let path = options
                .file_path
                .as_deref()
                .ok_or_else(|| Error::config("sqlite connection requires a file path"))?;
            rusqlite::Connection::open(path)
        }
        .map_err(Error::driver)?;

        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, rusqlite::Connection>> {
        self.connection
            .lock()
            .map_err(|e| Error::driver(format!("sqlite connection poisoned: {}", e)))
    }

    fn query_sync(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let connection = self.lock()?;
        let mut statement = connection.prepare(sql).map_err(Error::driver)?;
        let columns = statement
            .column_names()
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();

        let mut rows = statement
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(Error::driver)?;

        let mut result = vec![];
        while let Some(row) = rows.next().map_err(Error::driver)? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(match row.get_ref(i).map_err(Error::driver)? {
                    ValueRef::Null => Value::NULL,
                    ValueRef::Integer(value) => Value::Int(value),
                    ValueRef::Real(value) => Value::String(value.to_string()),
                    ValueRef::Text(value) | ValueRef::Blob(value) => {
                        Value::String(String::from_utf8_lossy(value).into_owned())
                    }
                });
            }

            result.push(Row::new(columns.clone(), values));
        }

        Ok(result)
    }

    fn execute_sync(&self, sql: &str, params: &[Value]) -> Result<usize> {
        let connection = self.lock()?;
        connection
            .execute(sql, rusqlite::params_from_iter(params.iter()))
            .map_err(Error::driver)
    }

    fn execute_transactional_sync(&self, statements: &[Statement]) -> Result<usize> {
        let mut connection = self.lock()?;
        let transaction = connection.transaction().map_err(Error::driver)?;

        for statement in statements {
            if statement.params.is_empty() {
                // migration bodies may hold more than one statement
                transaction
                    .execute_batch(&statement.sql)
                    .map_err(Error::driver)?;
            } else {
                transaction
                    .execute(
                        &statement.sql,
                        rusqlite::params_from_iter(statement.params.iter()),
                    )
                    .map_err(Error::driver)?;
            }
        }

        // dropping an uncommitted transaction rolls it back
        transaction.commit().map_err(Error::driver)?;
        Ok(statements.len())
    }
}

impl DriverConnection for Driver {
    fn placeholder(&self, position: usize) -> String {
        format!("?{}", position)
    }

    fn table_exists<'a>(&'a self, table_name: &'a str) -> AsyncResult<'a, bool> {
        Box::pin(async move {
            let rows = self.query_sync(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                &[Value::from(table_name)],
            )?;

            Ok(!rows.is_empty())
        })
    }

    fn query<'a>(&'a self, sql: &'a str, params: Vec<Value>) -> AsyncResult<'a, Vec<Row>> {
        Box::pin(async move { self.query_sync(sql, &params) })
    }

    fn execute_statement<'a>(&'a self, sql: &'a str, params: Vec<Value>) -> AsyncResult<'a, usize> {
        Box::pin(async move { self.execute_sync(sql, &params) })
    }

    fn execute_transactional(&self, statements: Vec<Statement>) -> AsyncResult<'_, usize> {
        Box::pin(async move { self.execute_transactional_sync(&statements) })
    }

    fn close(self: Box<Self>) -> AsyncResult<'static, ()> {
        Box::pin(async move {
            let connection = self
                .connection
                .into_inner()
                .map_err(|e| Error::driver(format!("sqlite connection poisoned: {}", e)))?;

            connection.close().map_err(|(_, e)| Error::driver(e))
        })
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::NULL => ToSqlOutput::from(rusqlite::types::Null),
            Value::Int(value) => ToSqlOutput::from(*value),
            Value::String(value) => ToSqlOutput::from(value.as_str()),
            Value::Boolean(value) => ToSqlOutput::from(*value),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::driver::connection::DriverConnection;
    use crate::driver::sqlite::driver::Driver;
    use crate::driver::statement::Statement;
    use crate::{ConnectionOptions, Value, params};

    fn memory_driver() -> Driver {
        let options = ConnectionOptions::try_from("sqlite://:memory:").unwrap();
        Driver::create(&options).expect("Must be connected")
    }

    #[tokio::test]
    async fn can_connect_to_file() {
        let mut file = std::env::temp_dir();
        file.push(format!("stepwise_driver_{}.sqlite", std::process::id()));
        let _ = std::fs::remove_file(&file);

        let options =
            ConnectionOptions::try_from(format!("sqlite://{}", file.display()).as_str()).unwrap();
        let driver = Box::new(Driver::create(&options).expect("Must be connected"));
        driver
            .execute_statement("CREATE TABLE t (id INTEGER)", params![])
            .await
            .unwrap();
        driver.close().await.expect("Close failed");

        assert!(file.exists());
        let _ = std::fs::remove_file(&file);
    }

    #[tokio::test]
    async fn can_query_with_parameters() {
        let driver = memory_driver();
        driver
            .execute_statement("CREATE TABLE t (name TEXT, flag BOOLEAN)", params![])
            .await
            .unwrap();

        let affected = driver
            .execute_statement("INSERT INTO t VALUES (?1, ?2)", params!["a", true])
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let rows = driver
            .query("SELECT name, flag FROM t WHERE name = ?1", params!["a"])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name").unwrap(), &Value::from("a"));
        assert_eq!(rows[0].get("flag").unwrap().as_bool(), Some(true));

        assert!(driver.table_exists("t").await.unwrap());
        assert!(!driver.table_exists("missing").await.unwrap());
    }

    #[tokio::test]
    async fn transactional_execution_is_all_or_nothing() {
        let driver = memory_driver();
        driver
            .execute_statement("CREATE TABLE t (id INTEGER PRIMARY KEY)", params![])
            .await
            .unwrap();

        let result = driver
            .execute_transactional(vec![
                Statement::new("INSERT INTO t VALUES (?1)", params![1_i64]),
                Statement::new("INSERT INTO t VALUES (?1)", params![1_i64]),
            ])
            .await;
        assert!(result.is_err());

        let rows = driver.query("SELECT id FROM t", params![]).await.unwrap();
        assert!(rows.is_empty());

        let executed = driver
            .execute_transactional(vec![Statement::from(
                "INSERT INTO t VALUES (1); INSERT INTO t VALUES (2);",
            )])
            .await
            .unwrap();
        assert_eq!(executed, 1);

        let rows = driver.query("SELECT id FROM t", params![]).await.unwrap();
        assert_eq!(rows.len(), 2);
    }
}
