use crate::migrate::{Direction, Migration};

pub(super) struct MigrationPlan {
    pub position: usize,
    pub migration: Migration,
    pub direction: Direction,
}

impl MigrationPlan {
    pub fn new(position: usize, migration: Migration, direction: Direction) -> Self {
        Self {
            position,
            migration,
            direction,
        }
    }

    pub fn identifier(&self) -> &str {
        self.migration.identifier.as_ref()
    }
}
