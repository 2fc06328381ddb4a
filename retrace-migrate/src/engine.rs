//! Update planning for a single table.
//!
//! The [`Updater`] ties the pipeline together: read history, walk it for
//! the configured table, rebuild the table's recorded shape, diff it
//! against the desired shape and emit the operations a new migration
//! needs.

use retrace_schema::{TableShape, UpdaterConfig};
use tracing::{info, warn};

use crate::diff::{ModificationSet, ShapeDiffer};
use crate::emit::{EmitOptions, EmittedOperation, OperationEmitter};
use crate::error::{MigrateResult, MigrationError};
use crate::history::{HistoryReader, HistoryStore};
use crate::reconstruct::reconstruct;
use crate::source::OperationSource;
use crate::walker::{HistoryWalker, StopReason};

/// What history says about the table compared to its desired shape.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// No migration history is recorded; the table must be created.
    NoHistory,
    /// History exists but never touches the table.
    NotTracked,
    /// The table was dropped by the given migration.
    Dropped {
        /// Migration holding the `dropTable`.
        migration: String,
    },
    /// The recorded shape already matches the desired one.
    UpToDate {
        /// Shape rebuilt from history.
        shape: TableShape,
        /// Why the history walk ended.
        reason: StopReason,
    },
    /// The recorded shape differs from the desired one.
    Changes {
        /// Shape rebuilt from history.
        shape: TableShape,
        /// Differences between desired and recorded shape.
        modifications: ModificationSet,
        /// Operations to write into the new migration, in emit order.
        operations: Vec<EmittedOperation>,
        /// Why the history walk ended.
        reason: StopReason,
    },
}

/// Result of planning an update for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    /// Table the plan is for.
    pub table: String,
    /// Number of migrations considered.
    pub migrations_read: usize,
    /// Planning outcome.
    pub outcome: UpdateOutcome,
}

impl UpdatePlan {
    /// Whether a new migration has to be generated.
    ///
    /// Only an up-to-date table needs nothing; every other outcome calls
    /// for either a full `createTable` or an update migration.
    pub fn requires_migration(&self) -> bool {
        !matches!(self.outcome, UpdateOutcome::UpToDate { .. })
    }

    /// Whether a full `createTable` migration is required.
    pub fn requires_creation(&self) -> bool {
        matches!(
            self.outcome,
            UpdateOutcome::NoHistory | UpdateOutcome::NotTracked | UpdateOutcome::Dropped { .. }
        )
    }

    /// Differences found, if the table is tracked and differs.
    pub fn modifications(&self) -> Option<&ModificationSet> {
        match &self.outcome {
            UpdateOutcome::Changes { modifications, .. } => Some(modifications),
            _ => None,
        }
    }

    /// Emitted update operations; empty unless the outcome is `Changes`.
    pub fn operations(&self) -> &[EmittedOperation] {
        match &self.outcome {
            UpdateOutcome::Changes { operations, .. } => operations,
            _ => &[],
        }
    }

    /// Shape rebuilt from history, if the table is tracked.
    pub fn recorded_shape(&self) -> Option<&TableShape> {
        match &self.outcome {
            UpdateOutcome::UpToDate { shape, .. } | UpdateOutcome::Changes { shape, .. } => {
                Some(shape)
            }
            _ => None,
        }
    }

    /// Human-readable one-line summary.
    pub fn summary(&self) -> String {
        match &self.outcome {
            UpdateOutcome::NoHistory => format!("No migration history, create table '{}'", self.table),
            UpdateOutcome::NotTracked => {
                format!("Table '{}' not found in migration history, create it", self.table)
            }
            UpdateOutcome::Dropped { migration } => {
                format!("Table '{}' dropped in {migration}, create it", self.table)
            }
            UpdateOutcome::UpToDate { .. } => format!("Table '{}' is up to date", self.table),
            UpdateOutcome::Changes { modifications, .. } => {
                format!("Table '{}': {}", self.table, modifications.summary())
            }
        }
    }
}

/// Plans the migration needed to bring one table up to date.
pub struct Updater<H, S> {
    config: UpdaterConfig,
    history: H,
    source: S,
}

impl<H: HistoryStore, S: OperationSource> Updater<H, S> {
    /// Create an updater, validating the configuration.
    pub fn new(config: UpdaterConfig, history: H, source: S) -> MigrateResult<Self> {
        config
            .validate()
            .map_err(|e| MigrationError::configuration(e.to_string()))?;

        Ok(Self {
            config,
            history,
            source,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Compare the table's recorded shape against `desired`.
    pub fn plan(&self, desired: &TableShape) -> MigrateResult<UpdatePlan> {
        let table = self.config.table.clone();

        let history = HistoryReader::new(&self.history)
            .skip_base(self.config.base_migration.as_deref())
            .fetch()?;
        let migrations_read = history.len();

        let plan = |outcome: UpdateOutcome| UpdatePlan {
            table: table.clone(),
            migrations_read,
            outcome,
        };

        if history.is_empty() {
            info!(table = %table, "no migration history found");
            return Ok(plan(UpdateOutcome::NoHistory));
        }

        let walk = HistoryWalker::new(&self.source).walk(&table, &history)?;

        match walk.stop_reason {
            StopReason::Dropped => {
                let migration = walk.boundary.unwrap_or_default();
                warn!(table = %table, migration = %migration, "table was dropped in migration history");
                return Ok(plan(UpdateOutcome::Dropped { migration }));
            }
            StopReason::Exhausted if walk.operations.is_empty() => {
                info!(table = %table, "table not found in migration history");
                return Ok(plan(UpdateOutcome::NotTracked));
            }
            StopReason::Exhausted | StopReason::Created => {}
        }

        if !walk.stop_reason.is_complete() {
            warn!(
                table = %table,
                subject = %walk.subject,
                operations = walk.operations.len(),
                "no createTable found in migration history, using partial shape"
            );
        }

        let shape = reconstruct(&walk.operations);
        let modifications = ShapeDiffer::new(desired).with_actual(&shape).diff();

        if modifications.is_empty() {
            info!(table = %table, "table is up to date");
            return Ok(plan(UpdateOutcome::UpToDate {
                shape,
                reason: walk.stop_reason,
            }));
        }

        let operations = OperationEmitter::new(table.as_str())
            .with_options(EmitOptions::from(&self.config))
            .emit(&modifications);

        info!(
            table = %table,
            changes = modifications.len(),
            summary = %modifications.summary(),
            "table requires update"
        );

        Ok(plan(UpdateOutcome::Changes {
            shape,
            modifications,
            operations,
            reason: walk.stop_reason,
        }))
    }

    /// Whether a new migration has to be generated for `desired`.
    pub fn is_update_required(&self, desired: &TableShape) -> MigrateResult<bool> {
        Ok(self.plan(desired)?.requires_migration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::EmitKind;
    use crate::history::{HistoryEntry, InMemoryHistory};
    use crate::source::InMemorySource;
    use pretty_assertions::assert_eq;
    use retrace_schema::{ColumnSpec, ColumnType, TableOperation, DEFAULT_BASE_MIGRATION};

    fn orders_source() -> InMemorySource {
        InMemorySource::new().with_migration(
            "m220101_000000_orders",
            [TableOperation::create_table(
                "orders",
                [
                    ("id", ColumnSpec::of_type(ColumnType::Pk)),
                    ("name", ColumnSpec::of_type(ColumnType::String).length(64)),
                ],
            )],
        )
    }

    fn orders_history() -> InMemoryHistory {
        InMemoryHistory::new([
            HistoryEntry::new(DEFAULT_BASE_MIGRATION, 1),
            HistoryEntry::new("m220101_000000_orders", 100),
        ])
    }

    fn recorded_orders() -> TableShape {
        TableShape::new()
            .column("id", ColumnSpec::of_type(ColumnType::Pk))
            .column("name", ColumnSpec::of_type(ColumnType::String).length(64))
    }

    #[test]
    fn test_rejects_empty_table_name() {
        let result = Updater::new(
            UpdaterConfig::new(" "),
            InMemoryHistory::absent(),
            InMemorySource::new(),
        );
        let err = result.err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_no_history() {
        let updater = Updater::new(
            UpdaterConfig::new("orders"),
            InMemoryHistory::absent(),
            InMemorySource::new(),
        )
        .unwrap();

        let plan = updater.plan(&recorded_orders()).unwrap();
        assert_eq!(plan.outcome, UpdateOutcome::NoHistory);
        assert!(plan.requires_migration());
        assert!(plan.requires_creation());
    }

    #[test]
    fn test_base_migration_only_counts_as_no_history() {
        let updater = Updater::new(
            UpdaterConfig::new("orders"),
            InMemoryHistory::new([HistoryEntry::new(DEFAULT_BASE_MIGRATION, 1)]),
            InMemorySource::new(),
        )
        .unwrap();

        let plan = updater.plan(&recorded_orders()).unwrap();
        assert_eq!(plan.outcome, UpdateOutcome::NoHistory);
        assert_eq!(plan.migrations_read, 0);
    }

    #[test]
    fn test_untracked_table() {
        let updater = Updater::new(
            UpdaterConfig::new("customers"),
            orders_history(),
            orders_source(),
        )
        .unwrap();

        let plan = updater.plan(&recorded_orders()).unwrap();
        assert_eq!(plan.outcome, UpdateOutcome::NotTracked);
        assert!(plan.requires_creation());
    }

    #[test]
    fn test_up_to_date() {
        let updater =
            Updater::new(UpdaterConfig::new("orders"), orders_history(), orders_source()).unwrap();

        let plan = updater.plan(&recorded_orders()).unwrap();
        assert!(!plan.requires_migration());
        assert!(plan.operations().is_empty());
        assert_eq!(plan.recorded_shape(), Some(&recorded_orders()));
        assert_eq!(plan.migrations_read, 1);
        assert!(!updater.is_update_required(&recorded_orders()).unwrap());
    }

    #[test]
    fn test_changes_are_emitted() {
        let updater =
            Updater::new(UpdaterConfig::new("orders"), orders_history(), orders_source()).unwrap();

        let desired = recorded_orders().column("note", ColumnSpec::of_type(ColumnType::Text));
        let plan = updater.plan(&desired).unwrap();

        assert!(plan.requires_migration());
        assert!(!plan.requires_creation());
        assert_eq!(plan.modifications().map(|m| m.len()), Some(1));

        let ops = plan.operations();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind, EmitKind::AddColumn);
        assert_eq!(ops[0].column(), Some("note"));
        assert_eq!(plan.summary(), "Table 'orders': Add 1 columns");
    }

    #[test]
    fn test_dropped_table() {
        let source = orders_source().with_migration(
            "m220201_000000_drop_orders",
            [TableOperation::drop_table("orders")],
        );
        let mut history = orders_history();
        history.push("m220201_000000_drop_orders", 200);

        let updater = Updater::new(UpdaterConfig::new("orders"), history, source).unwrap();
        let plan = updater.plan(&recorded_orders()).unwrap();

        assert_eq!(
            plan.outcome,
            UpdateOutcome::Dropped {
                migration: "m220201_000000_drop_orders".to_string()
            }
        );
        assert!(plan.requires_migration());
    }

    #[test]
    fn test_partial_history_still_diffs() {
        let source = InMemorySource::new().with_migration(
            "m220301_000000_note",
            [TableOperation::add_column(
                "orders",
                "note",
                ColumnSpec::of_type(ColumnType::Text),
            )],
        );
        let history = InMemoryHistory::new([HistoryEntry::new("m220301_000000_note", 300)]);

        let updater = Updater::new(UpdaterConfig::new("orders"), history, source).unwrap();
        let desired = TableShape::new().column("note", ColumnSpec::of_type(ColumnType::Text));
        let plan = updater.plan(&desired).unwrap();

        match plan.outcome {
            UpdateOutcome::UpToDate { reason, .. } => {
                assert_eq!(reason, StopReason::Exhausted);
                assert!(!reason.is_complete());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_missing_migration_aborts() {
        let mut history = orders_history();
        history.push("m220401_000000_missing", 400);

        let updater =
            Updater::new(UpdaterConfig::new("orders"), history, orders_source()).unwrap();
        let err = updater.plan(&recorded_orders()).unwrap_err();

        assert!(matches!(err, MigrationError::MigrationLoad { .. }));
    }
}
