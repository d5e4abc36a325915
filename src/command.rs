use crate::migrate::{Migrator, render_status};
use crate::{Connection, Error, Result};
use log::error;
use std::fmt::{Display, Formatter};
use std::process::ExitCode;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Migrate,
    Rollback,
    Refresh,
    Status,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "migrate" => Ok(Self::Migrate),
            "rollback" => Ok(Self::Rollback),
            "refresh" => Ok(Self::Refresh),
            "status" => Ok(Self::Status),
            _ => Err(format!("unknown command \"{}\", expected one of migrate, rollback, refresh or status", s).into()),
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Migrate => "migrate",
                Self::Rollback => "rollback",
                Self::Refresh => "refresh",
                Self::Status => "status",
            }
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum ExitStatus {
    Success = 0,
    Failed = 1,
    InvalidCommand = 2,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(value: ExitStatus) -> Self {
        ExitCode::from(value.code())
    }
}

impl Command {
    pub async fn execute(self, migrator: &Migrator, connection: &Connection) -> Result<()> {
        match self {
            Self::Migrate => migrator.migrate(connection).await,
            Self::Rollback => migrator.rollback(connection).await,
            Self::Refresh => migrator.refresh(connection).await,
            Self::Status => {
                let entries = migrator.status(connection).await?;
                if !entries.is_empty() {
                    println!("{}", render_status(&entries));
                }

                Ok(())
            }
        }
    }
}

/// Runs the command named by `command` and maps the outcome to an exit status.
///
/// Errors are reported on stderr; the status list goes to stdout.
pub async fn run_command(
    migrator: &Migrator,
    connection: &Connection,
    command: Option<&str>,
) -> ExitStatus {
    let command = match command.map(Command::from_str) {
        Some(Ok(command)) => command,
        Some(Err(e)) => {
            eprintln!("{}", e);
            return ExitStatus::InvalidCommand;
        }
        None => {
            eprintln!("missing command, expected one of migrate, rollback, refresh or status");
            return ExitStatus::InvalidCommand;
        }
    };

    match command.execute(migrator, connection).await {
        Ok(_) => ExitStatus::Success,
        Err(e) => {
            error!(target: "stepwise::migrate", "Command {} failed: {}", command, e);
            eprintln!("{}", e);
            ExitStatus::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, ExitStatus, run_command};
    use crate::Connection;
    use crate::ledger::{LedgerRecord, MemoryLedgerStore};
    use crate::migrate::{Executor, Migration, Migrator};
    use std::borrow::Cow;

    fn noop(_: &mut Executor) -> crate::Result<()> {
        Ok(())
    }

    const MIGRATIONS: &[Migration] = &[
        Migration::new("001_a", &noop, &noop),
        Migration::new("002_b", &noop, &noop),
    ];

    fn connection() -> Connection {
        Connection::create_from_dsn("sqlite://:memory:", None).unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!("migrate".parse::<Command>().unwrap(), Command::Migrate);
        assert_eq!("rollback".parse::<Command>().unwrap(), Command::Rollback);
        assert_eq!("refresh".parse::<Command>().unwrap(), Command::Refresh);
        assert_eq!("status".parse::<Command>().unwrap(), Command::Status);
        assert!("Migrate".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }

    #[test]
    fn exit_status_codes() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::Failed.code(), 1);
        assert_eq!(ExitStatus::InvalidCommand.code(), 2);
    }

    #[tokio::test]
    async fn invalid_command_is_reported() {
        let migrator = Migrator::new(Cow::Borrowed(MIGRATIONS))
            .with_ledger_store(MemoryLedgerStore::new())
            .await;

        let connection = connection();
        assert_eq!(
            run_command(&migrator, &connection, Some("upgrade")).await,
            ExitStatus::InvalidCommand
        );
        assert_eq!(
            run_command(&migrator, &connection, None).await,
            ExitStatus::InvalidCommand
        );
    }

    #[tokio::test]
    async fn successful_commands() {
        let store = MemoryLedgerStore::new();
        let migrator = Migrator::new(Cow::Borrowed(MIGRATIONS))
            .with_ledger_store(store.clone())
            .await;

        let connection = connection();
        assert_eq!(
            run_command(&migrator, &connection, Some("migrate")).await,
            ExitStatus::Success
        );
        assert!(store.records().await.iter().all(|r| r.applied));

        assert_eq!(
            run_command(&migrator, &connection, Some("status")).await,
            ExitStatus::Success
        );
    }

    #[tokio::test]
    async fn failed_command() {
        let store = MemoryLedgerStore::with_records(vec![
            LedgerRecord::new("001_a", true),
            LedgerRecord::new("002_b", true),
            LedgerRecord::new("003_c", false),
        ]);
        let migrator = Migrator::new(Cow::Borrowed(MIGRATIONS))
            .with_ledger_store(store)
            .await;

        assert_eq!(
            run_command(&migrator, &connection(), Some("rollback")).await,
            ExitStatus::Failed
        );
    }
}
