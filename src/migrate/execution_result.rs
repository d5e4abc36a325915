use crate::Error;

/// Outcome of a single migration operation.
pub(super) struct ExecutionResult {
    pub execution_time: i64,
    pub sql_count: usize,
    pub skipped: bool,
    pub error: Option<Error>,
}
