use crate::driver::connection::DriverConnection;
use crate::driver::statement::Statement;
use crate::sync::{JoinHandle, spawn};
use crate::{AsyncResult, ConnectionOptions, Error, Result, Row, Value};
use log::error;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, Config, NoTls};

type BoxedParam = Box<dyn ToSql + Sync + Send>;

pub struct Driver {
    client: Client,
    handle: JoinHandle<()>,
}

impl Driver {
    fn build_config(options: &ConnectionOptions) -> Config {
        let mut config = Config::new();
        if let Some(host) = options.host.as_deref().filter(|host| !host.is_empty()) {
            config.host(host);
        }

        if let Some(port) = options.port {
            config.port(port);
        }

        config.user(options.username.as_deref().unwrap_or("postgres"));
        if let Some(password) = options.password.as_deref() {
            config.password(password);
        }

        config.dbname(options.database_name.as_deref().unwrap_or("postgres"));
        if let Some(application_name) = options
            .application_name
            .as_deref()
            .filter(|name| !name.is_empty())
        {
            config.application_name(application_name);
        }

        config
    }

    pub async fn create(options: &ConnectionOptions) -> Result<Self> {
        let (client, connection) = Self::build_config(options)
            .connect(NoTls)
            .await
            .map_err(Error::driver)?;

        let handle = spawn(async move {
            if let Err(e) = connection.await {
                error!(target: "stepwise::driver", "postgres connection error: {}", e);
            }
        });

        Ok(Self { client, handle })
    }

    fn to_sql_params(params: &[Value]) -> Vec<BoxedParam> {
        params
            .iter()
            .map(|value| -> BoxedParam {
                match value {
                    Value::NULL => Box::new(Option::<String>::None),
                    Value::Int(value) => Box::new(*value),
                    Value::String(value) => Box::new(value.clone()),
                    Value::Boolean(value) => Box::new(*value),
                }
            })
            .collect()
    }

    fn convert_row(row: &tokio_postgres::Row) -> Result<Row> {
        let mut columns = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());

        for (i, column) in row.columns().iter().enumerate() {
            columns.push(column.name().to_string());

            let column_type = column.type_();
            let value = if *column_type == Type::BOOL {
                row.try_get::<_, Option<bool>>(i)
                    .map(|v| v.map(Value::Boolean))
            } else if *column_type == Type::INT2 {
                row.try_get::<_, Option<i16>>(i)
                    .map(|v| v.map(|v| Value::Int(v as i64)))
            } else if *column_type == Type::INT4 {
                row.try_get::<_, Option<i32>>(i)
                    .map(|v| v.map(|v| Value::Int(v as i64)))
            } else if *column_type == Type::INT8 {
                row.try_get::<_, Option<i64>>(i).map(|v| v.map(Value::Int))
            } else {
                row.try_get::<_, Option<String>>(i)
                    .map(|v| v.map(Value::String))
            }
            .map_err(Error::driver)?;

            values.push(value.unwrap_or_default());
        }

        Ok(Row::new(columns, values))
    }

    async fn execute_one(&self, sql: &str, params: &[Value]) -> Result<u64> {
        if params.is_empty() {
            // the simple query protocol accepts multiple statements
            self.client.batch_execute(sql).await.map_err(Error::driver)?;
            return Ok(0);
        }

        let boxed = Self::to_sql_params(params);
        let refs = boxed
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect::<Vec<_>>();

        self.client
            .execute(sql, &refs)
            .await
            .map_err(Error::driver)
    }
}

impl DriverConnection for Driver {
    fn placeholder(&self, position: usize) -> String {
        format!("${}", position)
    }

    fn table_exists<'a>(&'a self, table_name: &'a str) -> AsyncResult<'a, bool> {
        Box::pin(async move {
            let rows = self
                .query(
                    "SELECT table_name FROM information_schema.tables WHERE table_schema = current_schema() AND table_name = $1",
                    vec![Value::from(table_name)],
                )
                .await?;

            Ok(!rows.is_empty())
        })
    }

    fn query<'a>(&'a self, sql: &'a str, params: Vec<Value>) -> AsyncResult<'a, Vec<Row>> {
        Box::pin(async move {
            let boxed = Self::to_sql_params(&params);
            let refs = boxed
                .iter()
                .map(|p| p.as_ref() as &(dyn ToSql + Sync))
                .collect::<Vec<_>>();

            let rows = self.client.query(sql, &refs).await.map_err(Error::driver)?;
            rows.iter().map(Self::convert_row).collect()
        })
    }

    fn execute_statement<'a>(&'a self, sql: &'a str, params: Vec<Value>) -> AsyncResult<'a, usize> {
        Box::pin(async move { Ok(self.execute_one(sql, &params).await? as usize) })
    }

    fn execute_transactional(&self, statements: Vec<Statement>) -> AsyncResult<'_, usize> {
        Box::pin(async move {
            self.client
                .batch_execute("BEGIN")
                .await
                .map_err(Error::driver)?;

            for statement in statements.iter() {
                if let Err(e) = self.execute_one(&statement.sql, &statement.params).await {
                    let _ = self.client.batch_execute("ROLLBACK").await;
                    return Err(e);
                }
            }

            if let Err(e) = self.client.batch_execute("COMMIT").await {
                let _ = self.client.batch_execute("ROLLBACK").await;
                return Err(Error::driver(e));
            }

            Ok(statements.len())
        })
    }

    fn close(self: Box<Self>) -> AsyncResult<'static, ()> {
        Box::pin(async move {
            let Driver { client, handle } = *self;
            drop(client);

            handle.await.map_err(Error::driver)
        })
    }
}


#[cfg(all(test, feature = "functional-tests"))]
mod functional_tests {
    use crate::driver::connection::DriverConnection;
    use crate::driver::postgres::driver::Driver;
    use crate::driver::statement::Statement;
    use crate::{ConnectionOptions, Value, params};
    use serial_test::serial;

    async fn connect() -> Driver {
        let options =
            ConnectionOptions::try_from(std::env::var("DATABASE_DSN").unwrap().as_ref()).unwrap();
        Driver::create(&options).await.expect("Must be connected")
    }

    #[tokio::test]
    #[serial]
    async fn can_query_with_parameters() {
        let driver = connect().await;
        let rows = driver
            .query("SELECT $1::TEXT AS name, TRUE AS flag", params!["a"])
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name").unwrap(), &Value::from("a"));
        assert_eq!(rows[0].get("flag").unwrap(), &Value::Boolean(true));
        Box::new(driver).close().await.unwrap();
    }

    #[tokio::test]
    #[serial]
    async fn transactional_execution_is_all_or_nothing() {
        let driver = connect().await;
        driver
            .execute_statement("DROP TABLE IF EXISTS stepwise_tx_test", params![])
            .await
            .unwrap();
        driver
            .execute_statement("CREATE TABLE stepwise_tx_test (id BIGINT PRIMARY KEY)", params![])
            .await
            .unwrap();

        let result = driver
            .execute_transactional(vec![
                Statement::new("INSERT INTO stepwise_tx_test VALUES ($1)", params![1_i64]),
                Statement::new("INSERT INTO stepwise_tx_test VALUES ($1)", params![1_i64]),
            ])
            .await;
        assert!(result.is_err());

        let rows = driver
            .query("SELECT id FROM stepwise_tx_test", params![])
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert!(driver.table_exists("stepwise_tx_test").await.unwrap());

        driver
            .execute_statement("DROP TABLE stepwise_tx_test", params![])
            .await
            .unwrap();
    }
}
