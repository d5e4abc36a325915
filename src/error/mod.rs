use std::backtrace::Backtrace;
use std::fmt::{Debug, Display, Formatter};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    DeletedMigration = 1,
    HistoryMismatch = 2,
    DuplicateMigration = 3,
    LedgerRead = 4,
    LedgerWrite = 5,
    RecordNotFound = 6,
    MigrationOperation = 7,
    SkipMigration = 8,

    Config = 101,
    UnknownDriver = 102,
    Driver = 103,

    Unknown = -1,
}

pub struct Error {
    kind: ErrorKind,
    identifier: Option<String>,
    inner: Box<dyn std::error::Error + Send + Sync>,
    backtrace: Backtrace,
}

/// Wraps an [`Error`] to expose it as a [`std::error::Error`].
pub struct StdError(Error);

impl Display for StdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Debug for StdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for StdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.inner.as_ref())
    }
}

impl From<Error> for StdError {
    fn from(e: Error) -> Self {
        StdError(e)
    }
}

impl Error {
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error {
            kind,
            identifier: None,
            inner: error.into(),
            backtrace: Backtrace::capture(),
        }
    }

    fn with_identifier(mut self, identifier: &str) -> Self {
        self.identifier = Some(identifier.to_string());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The migration identifier this error refers to, if any.
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    pub fn deleted_migration(records: usize, definitions: usize) -> Self {
        Self::new(
            ErrorKind::DeletedMigration,
            format!(
                "Ledger holds {} records but only {} migrations are defined: migration files must not be deleted once recorded",
                records, definitions
            ),
        )
    }

    pub fn history_mismatch(position: usize, recorded: &str, defined: &str) -> Self {
        Self::new(
            ErrorKind::HistoryMismatch,
            format!(
                "Recorded migration \"{}\" at position {} does not match defined migration \"{}\"",
                recorded, position, defined
            ),
        )
        .with_identifier(recorded)
    }

    pub fn duplicate_migration(identifier: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateMigration,
            format!("Migration \"{}\" is defined more than once", identifier),
        )
        .with_identifier(identifier)
    }

    pub fn ledger_read(error: Error) -> Self {
        Self::wrap(ErrorKind::LedgerRead, error)
    }

    pub fn ledger_write(error: Error) -> Self {
        Self::wrap(ErrorKind::LedgerWrite, error)
    }

    pub fn record_not_found(identifier: &str) -> Self {
        Self::new(
            ErrorKind::RecordNotFound,
            format!("No ledger record found for migration \"{}\"", identifier),
        )
        .with_identifier(identifier)
    }

    pub fn migration_operation(identifier: &str, error: Error) -> Self {
        let message = format!("Migration \"{}\" failed: {}", identifier, error);
        Self::new(ErrorKind::MigrationOperation, message).with_identifier(identifier)
    }

    /// Returned by a migration operation to mark itself as done without
    /// running anything.
    pub fn skip_migration() -> Self {
        Self::new(ErrorKind::SkipMigration, "Migration skipped")
    }

    pub fn config(message: &str) -> Self {
        Self::new(ErrorKind::Config, message.to_string())
    }

    pub fn unknown_driver(scheme: &str) -> Self {
        Self::new(
            ErrorKind::UnknownDriver,
            format!("Unknown or disabled driver \"{}\"", scheme),
        )
    }

    pub fn driver<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Driver, error)
    }

    // Ledger errors keep the identifier of the wrapped error, if any.
    fn wrap(kind: ErrorKind, error: Error) -> Self {
        if error.kind == kind {
            return error;
        }

        let identifier = error.identifier.clone();
        let mut wrapped = Self::new(kind, StdError(error));
        wrapped.identifier = identifier;
        wrapped
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:?}] {}\nBacktrace:\n{}",
            self.kind, self.inner, self.backtrace
        )
    }
}

impl<T> From<T> for Error
where
    T: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn from(err: T) -> Self {
        Error::new(ErrorKind::Unknown, err)
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};

    #[test]
    fn operation_errors_carry_the_identifier() {
        let error = Error::migration_operation("20240101_users", Error::from("boom"));
        assert_eq!(error.kind(), ErrorKind::MigrationOperation);
        assert_eq!(error.identifier(), Some("20240101_users"));
        assert_eq!(
            error.to_string(),
            "Migration \"20240101_users\" failed: boom"
        );
    }

    #[test]
    fn ledger_wrapping_keeps_kind_and_identifier() {
        let error = Error::ledger_write(Error::record_not_found("a"));
        assert_eq!(error.kind(), ErrorKind::LedgerWrite);
        assert_eq!(error.identifier(), Some("a"));

        let again = Error::ledger_write(error);
        assert_eq!(again.kind(), ErrorKind::LedgerWrite);
    }

    #[test]
    fn foreign_errors_are_unknown() {
        let error: Error = "anything".into();
        assert_eq!(error.kind(), ErrorKind::Unknown);
    }
}
