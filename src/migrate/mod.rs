mod execution_result;
mod executor;
mod migration_plan;
pub mod reconciler;
mod runner;
mod status;

pub use crate::migrate::executor::Executor;
pub use crate::migrate::reconciler::{ReconciledList, reconcile};
pub use crate::migrate::status::{StatusEntry, render_status};

use crate::ledger::{LedgerStore, TableLedgerStore};
use crate::migrate::runner::Runner;
use crate::sync::Mutex;
use crate::{Connection, Result};
use log::{error, warn};
use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    Up,
    Down,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Up => "up",
                Self::Down => "down",
            }
        )
    }
}

/// What `refresh` does when its backward pass fails.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum RefreshPolicy {
    /// Run the forward pass anyway, over whatever state remains.
    #[default]
    ContinueOnRollbackFailure,
    AbortOnRollbackFailure,
}

pub type OpClosure = dyn (Fn(&mut Executor) -> Result<()>) + Send + Sync;
pub type DescriptionClosure = dyn (Fn() -> &'static str) + Send + Sync;

/// A migration unit.
///
/// The ledger has no "in progress" state: if the process dies between the
/// operation and the status write, the operation runs again on the next
/// pass. Both `up` and `down` must therefore be safe to re-run.
///
/// An operation may return [`crate::Error::skip_migration`] to skip itself:
/// its queued SQL is discarded but the unit is still marked as done.
#[derive(Clone)]
pub struct Migration {
    pub identifier: Cow<'static, str>,
    pub description: Option<&'static DescriptionClosure>,
    pub up: &'static OpClosure,
    pub down: &'static OpClosure,
}

impl Migration {
    pub const fn new(
        identifier: &'static str,
        up: &'static OpClosure,
        down: &'static OpClosure,
    ) -> Self {
        Self {
            identifier: Cow::Borrowed(identifier),
            description: None,
            up,
            down,
        }
    }

    pub const fn with_description(mut self, description: &'static DescriptionClosure) -> Self {
        self.description = Some(description);
        self
    }
}

#[derive(Copy, Clone)]
enum Operation {
    Migrate,
    Rollback,
    Refresh,
    Status,
}

pub struct Migrator {
    migrations: Cow<'static, [Migration]>,
    refresh_policy: RefreshPolicy,
    ledger_store: Mutex<Option<Box<dyn LedgerStore>>>,
}

impl Migrator {
    pub const fn new(migrations: Cow<'static, [Migration]>) -> Self {
        Self {
            migrations,
            refresh_policy: RefreshPolicy::ContinueOnRollbackFailure,
            ledger_store: Mutex::const_new(None),
        }
    }

    pub const fn with_refresh_policy(mut self, refresh_policy: RefreshPolicy) -> Self {
        self.refresh_policy = refresh_policy;
        self
    }

    /// Replaces the ledger table of the target database with a custom store.
    pub async fn with_ledger_store<M: LedgerStore + 'static>(self, ledger_store: M) -> Self {
        {
            let mut guard = self.ledger_store.lock().await;
            let _ = guard.insert(Box::new(ledger_store));
        }

        self
    }

    /// Applies every pending migration, in ascending identifier order.
    pub async fn migrate(&self, connection: &Connection) -> Result<()> {
        self.perform(connection, Operation::Migrate).await?;
        Ok(())
    }

    /// Reverts every applied migration, in descending identifier order.
    pub async fn rollback(&self, connection: &Connection) -> Result<()> {
        self.perform(connection, Operation::Rollback).await?;
        Ok(())
    }

    /// Reverts everything, then applies everything again.
    pub async fn refresh(&self, connection: &Connection) -> Result<()> {
        self.perform(connection, Operation::Refresh).await?;
        Ok(())
    }

    pub async fn status(&self, connection: &Connection) -> Result<Vec<StatusEntry>> {
        let list = self.perform(connection, Operation::Status).await?;
        Ok(list.iter().map(StatusEntry::from).collect())
    }

    fn sorted_migrations(&self) -> Vec<Migration> {
        let mut migrations = self.migrations.to_vec();
        migrations.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        migrations
    }

    async fn perform(&self, connection: &Connection, operation: Operation) -> Result<ReconciledList> {
        let guard = self.ledger_store.lock().await;
        let table_store;
        let store: &dyn LedgerStore = match guard.deref() {
            Some(store) => &**store,
            None => {
                table_store = TableLedgerStore::new(connection);
                &table_store
            }
        };

        let migrations = self.sorted_migrations();
        let identifiers = migrations
            .iter()
            .map(|migration| migration.identifier.as_ref())
            .collect::<Vec<_>>();

        let mut list = reconcile(&identifiers[..], store).await?;
        let runner = Runner::new(connection, store, &migrations);

        match operation {
            Operation::Migrate => runner.run(Direction::Up, &mut list).await?,
            Operation::Rollback => runner.run(Direction::Down, &mut list).await?,
            Operation::Refresh => self.run_refresh(&runner, &mut list).await?,
            Operation::Status => (),
        };

        Ok(list)
    }

    async fn run_refresh(&self, runner: &Runner<'_>, list: &mut ReconciledList) -> Result<()> {
        let rollback_error = match runner.run(Direction::Down, list).await {
            Ok(_) => None,
            Err(e) if self.refresh_policy == RefreshPolicy::AbortOnRollbackFailure => {
                return Err(e);
            }
            Err(e) => {
                warn!(target: "stepwise::migrate", "Rollback failed, migrating anyway: {}", e);
                Some(e)
            }
        };

        if let Err(e) = runner.run(Direction::Up, list).await {
            if let Some(rollback_error) = rollback_error {
                error!(target: "stepwise::migrate", "Refresh rollback failed as well: {}", rollback_error);
            }

            return Err(e);
        }

        match rollback_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
