use crate::core::{Result, SchemaError};
use crate::storage::persistence::{read_file, write_atomic};
use crate::storage::SchemaStore;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One migration step. `name()` is the ordering key (timestamp-prefixed by
/// convention) and must be unique across the registered set.
pub trait Migration {
    fn name(&self) -> &str;

    fn up(&self, store: &mut SchemaStore) -> Result<()>;

    fn down(&self, store: &mut SchemaStore) -> Result<()>;
}

/// Explicit record of which migrations have been committed, advanced
/// monotonically by the runner and persisted beside the schema snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MigrationLedger {
    applied: Vec<String>,
}

impl MigrationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let data = read_file(path)?;
        rmp_serde::from_slice(&data)
            .map_err(|e| SchemaError::Storage(format!("Failed to deserialize ledger: {}", e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = rmp_serde::to_vec(self)
            .map_err(|e| SchemaError::Storage(format!("Failed to serialize ledger: {}", e)))?;
        write_atomic(path, &serialized)
    }

    pub fn is_applied(&self, name: &str) -> bool {
        self.applied.iter().any(|n| n == name)
    }

    pub fn applied(&self) -> &[String] {
        &self.applied
    }

    fn record(&mut self, name: &str) {
        self.applied.push(name.to_string());
    }

    fn unrecord_last(&mut self) -> Option<String> {
        self.applied.pop()
    }
}

/// Runs registered migrations in name order against a store.
///
/// The runner takes `&mut SchemaStore`, so one migration sequence at a time
/// holds the store exclusively; the ledger is passed in and returned rather
/// than kept as ambient state.
#[derive(Default)]
pub struct MigrationRunner {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a migration, rejecting duplicate names up front.
    pub fn register(&mut self, migration: Box<dyn Migration>) -> Result<()> {
        if self.migrations.iter().any(|m| m.name() == migration.name()) {
            return Err(SchemaError::Validation(format!(
                "Duplicate migration name '{}'",
                migration.name()
            )));
        }
        self.migrations.push(migration);
        self.migrations.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(())
    }

    pub fn with(mut self, migration: Box<dyn Migration>) -> Result<Self> {
        self.register(migration)?;
        Ok(self)
    }

    /// Validates the registered set against the ledger: every applied name
    /// must still be known, so a renamed or dropped migration is caught
    /// before anything runs.
    pub fn validate(&self, ledger: &MigrationLedger) -> Result<()> {
        let known: HashSet<&str> = self.migrations.iter().map(|m| m.name()).collect();
        for name in ledger.applied() {
            if !known.contains(name.as_str()) {
                return Err(SchemaError::Validation(format!(
                    "Ledger references unknown migration '{}'",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Applies every pending migration in order, recording each one in the
    /// ledger (persisted after every committed step). Halts on the first
    /// failure; already-committed steps stay recorded.
    pub fn up_all(
        &self,
        store: &mut SchemaStore,
        mut ledger: MigrationLedger,
    ) -> Result<MigrationLedger> {
        self.validate(&ledger)?;

        let ledger_path = store.data_dir().join("migrations.ledger");
        for migration in &self.migrations {
            if ledger.is_applied(migration.name()) {
                continue;
            }
            info!("Applying migration '{}'", migration.name());
            migration.up(store)?;
            ledger.record(migration.name());
            ledger.save(&ledger_path)?;
        }
        Ok(ledger)
    }

    /// Reverts the most recently applied migration and removes it from the
    /// ledger so it can run again.
    pub fn down_last(
        &self,
        store: &mut SchemaStore,
        mut ledger: MigrationLedger,
    ) -> Result<MigrationLedger> {
        self.validate(&ledger)?;

        let Some(name) = ledger.unrecord_last() else {
            return Ok(ledger);
        };
        let migration = self
            .migrations
            .iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| {
                SchemaError::Validation(format!("Unknown migration '{}' in ledger", name))
            })?;

        info!("Reverting migration '{}'", name);
        migration.down(store)?;
        ledger.save(&store.data_dir().join("migrations.ledger"))?;
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Noop(&'static str);

    impl Migration for Noop {
        fn name(&self) -> &str {
            self.0
        }
        fn up(&self, _store: &mut SchemaStore) -> Result<()> {
            Ok(())
        }
        fn down(&self, _store: &mut SchemaStore) -> Result<()> {
            Ok(())
        }
    }

    struct Failing;

    impl Migration for Failing {
        fn name(&self) -> &str {
            "2_failing"
        }
        fn up(&self, _store: &mut SchemaStore) -> Result<()> {
            Err(SchemaError::Storage("boom".to_string()))
        }
        fn down(&self, _store: &mut SchemaStore) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_up_all_records_in_name_order() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SchemaStore::open(temp_dir.path()).unwrap();

        // Registered out of order on purpose.
        let runner = MigrationRunner::new()
            .with(Box::new(Noop("2_second")))
            .unwrap()
            .with(Box::new(Noop("1_first")))
            .unwrap();

        let ledger = runner.up_all(&mut store, MigrationLedger::new()).unwrap();
        assert_eq!(ledger.applied(), ["1_first", "2_second"]);
    }

    #[test]
    fn test_up_all_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SchemaStore::open(temp_dir.path()).unwrap();
        let runner = MigrationRunner::new().with(Box::new(Noop("1_first"))).unwrap();

        let ledger = runner.up_all(&mut store, MigrationLedger::new()).unwrap();
        let ledger = runner.up_all(&mut store, ledger).unwrap();
        assert_eq!(ledger.applied().len(), 1);
    }

    #[test]
    fn test_failure_halts_sequence_but_keeps_progress() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SchemaStore::open(temp_dir.path()).unwrap();

        let runner = MigrationRunner::new()
            .with(Box::new(Noop("1_first")))
            .unwrap()
            .with(Box::new(Failing))
            .unwrap()
            .with(Box::new(Noop("3_third")))
            .unwrap();

        let err = runner.up_all(&mut store, MigrationLedger::new()).unwrap_err();
        assert!(matches!(err, SchemaError::Storage(_)));

        // First step committed and survives on disk; third never ran.
        let ledger = MigrationLedger::load(&store.data_dir().join("migrations.ledger")).unwrap();
        assert_eq!(ledger.applied(), ["1_first"]);
    }

    #[test]
    fn test_down_last_pops_ledger() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SchemaStore::open(temp_dir.path()).unwrap();
        let runner = MigrationRunner::new().with(Box::new(Noop("1_first"))).unwrap();

        let ledger = runner.up_all(&mut store, MigrationLedger::new()).unwrap();
        let ledger = runner.down_last(&mut store, ledger).unwrap();
        assert!(ledger.applied().is_empty());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut runner = MigrationRunner::new();
        runner.register(Box::new(Noop("1_first"))).unwrap();
        assert!(runner.register(Box::new(Noop("1_first"))).is_err());
    }

    #[test]
    fn test_unknown_applied_name_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SchemaStore::open(temp_dir.path()).unwrap();

        let mut ledger = MigrationLedger::new();
        ledger.record("ghost");

        let runner = MigrationRunner::new();
        assert!(runner.up_all(&mut store, ledger).is_err());
    }
}
