use crate::ledger::LedgerStore;
use crate::migrate::executor::Executor;
use crate::migrate::migration_plan::MigrationPlan;
use crate::migrate::reconciler::ReconciledList;
use crate::migrate::{Direction, Migration};
use crate::{Connection, Error, Result};
use log::{error, info};

/// Walks a reconciled list in one direction, one unit at a time.
pub(super) struct Runner<'a> {
    connection: &'a Connection,
    store: &'a dyn LedgerStore,
    migrations: &'a [Migration],
}

impl<'a> Runner<'a> {
    /// `migrations` must be sorted, so that they are aligned with the
    /// reconciled list.
    pub fn new(
        connection: &'a Connection,
        store: &'a dyn LedgerStore,
        migrations: &'a [Migration],
    ) -> Self {
        Self {
            connection,
            store,
            migrations,
        }
    }

    fn plan(&self, list: &ReconciledList, direction: Direction) -> Vec<MigrationPlan> {
        let mut plans = list
            .iter()
            .zip(self.migrations.iter())
            .enumerate()
            .filter(|(_, (record, _))| record.applied == (direction == Direction::Down))
            .map(|(position, (_, migration))| {
                MigrationPlan::new(position, migration.clone(), direction)
            })
            .collect::<Vec<_>>();

        if direction == Direction::Down {
            plans.reverse();
        }

        plans
    }

    /// Runs every unit not yet in the target state of `direction`, stopping
    /// at the first failure. The list is updated as units complete.
    pub async fn run(&self, direction: Direction, list: &mut ReconciledList) -> Result<()> {
        let plans = self.plan(list, direction);
        info!(target: "stepwise::migrate", "Migrating {}, {} of {} migrations to execute", direction, plans.len(), list.len());

        if plans.is_empty() {
            info!(target: "stepwise::migrate", "No migration to execute.");
            return Ok(());
        }

        let mut executor = Executor::new(self.connection);
        let plans_count = plans.len();
        let mut sql_count: usize = 0;
        let applied = direction == Direction::Up;

        let global_start = chrono::Utc::now();
        for plan in plans {
            let execution_result = executor.execute(&plan).await;
            if let Some(error) = execution_result.error {
                error!(target: "stepwise::migrate", "Error while executing migration {}: {}", plan.identifier(), error);
                return Err(Error::migration_operation(plan.identifier(), error));
            }

            sql_count += execution_result.sql_count;
            if let Err(e) = self.store.set_applied(plan.identifier(), applied).await {
                error!(target: "stepwise::migrate", "Unable to record status of migration {}: {}", plan.identifier(), e);
                return Err(Error::ledger_write(e));
            }

            list.set_applied(plan.position, applied);
            info!(
                target: "stepwise::migrate",
                "-- {} {} in {}ms",
                if execution_result.skipped { "skipped" } else if applied { "migrated" } else { "reverted" },
                plan.identifier(),
                execution_result.execution_time,
            );
        }

        let total_time = chrono::Utc::now() - global_start;
        info!(target: "stepwise::migrate", "Migrated database {} in {}ms, {} migrations executed, {} sql queries", direction, total_time.num_milliseconds(), plans_count, sql_count);

        Ok(())
    }
}
