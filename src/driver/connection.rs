use crate::driver::statement::Statement;
use crate::{AsyncResult, Row, Value};

pub trait DriverConnection: Send + Sync {
    /// Returns the positional placeholder for the 1-indexed `position`.
    fn placeholder(&self, position: usize) -> String;

    /// Checks whether a table with the given (unquoted) name exists.
    fn table_exists<'a>(&'a self, table_name: &'a str) -> AsyncResult<'a, bool>;

    /// Executes an SQL statement, returning all the rows of its result set.
    fn query<'a>(&'a self, sql: &'a str, params: Vec<Value>) -> AsyncResult<'a, Vec<Row>>;

    /// Executes a single statement, returning the number of affected rows.
    fn execute_statement<'a>(&'a self, sql: &'a str, params: Vec<Value>) -> AsyncResult<'a, usize>;

    /// Executes all the statements in a single transaction.
    /// If any of them fails, the transaction is rolled back.
    fn execute_transactional(&self, statements: Vec<Statement>) -> AsyncResult<'_, usize>;

    /// Closes the underlying connection.
    fn close(self: Box<Self>) -> AsyncResult<'static, ()>;
}
