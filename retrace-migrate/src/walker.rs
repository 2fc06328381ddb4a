//! Backward walk over migration history.
//!
//! Migrations are visited newest first and each one's operations are
//! scanned in reverse, so operations are collected newest effect first.
//! The walk follows the *subject* table across renames and stops at the
//! first `createTable` or `dropTable` it meets for the subject.

use std::fmt;

use retrace_schema::{Operation, TableOperation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::MigrateResult;
use crate::history::MigrationRecord;
use crate::source::OperationSource;

/// Why a history walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The subject's `createTable` was reached and collected.
    Created,
    /// The subject was dropped; nothing older applies.
    Dropped,
    /// History ran out without a creation boundary.
    Exhausted,
}

impl StopReason {
    /// Whether the collected operations fully describe the table.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Created)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Dropped => f.write_str("dropped"),
            Self::Exhausted => f.write_str("exhausted"),
        }
    }
}

/// Result of walking history for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOutcome {
    /// Operations for the subject, newest effect first.
    pub operations: Vec<TableOperation>,
    /// Why the walk ended.
    pub stop_reason: StopReason,
    /// Name the table was known by where the walk ended.
    pub subject: String,
    /// Migration holding the create/drop boundary, if one was reached.
    pub boundary: Option<String>,
}

/// Walks history backwards collecting a table's operations.
pub struct HistoryWalker<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: OperationSource + ?Sized> HistoryWalker<'a, S> {
    /// Create a walker pulling operations from the given source.
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Walk `history` (newest first) collecting operations for `subject`.
    ///
    /// Loading failures abort the walk; a partially walked history is never
    /// reported as complete.
    pub fn walk(&self, subject: &str, history: &[MigrationRecord]) -> MigrateResult<WalkOutcome> {
        let mut subject = subject.to_string();
        let mut collected = Vec::new();

        for record in history {
            debug!(
                migration = %record.id,
                applied_at = ?record.applied_at_utc(),
                subject = %subject,
                "replaying migration"
            );

            let operations = self.source.operations_for(&record.id)?;
            let pending: Vec<&TableOperation> = operations.iter().rev().collect();

            let scan = scan_migration(&pending, subject, collected);
            subject = scan.subject;
            collected = scan.collected;

            if let Some(stop_reason) = scan.boundary {
                info!(
                    migration = %record.id,
                    subject = %subject,
                    reason = %stop_reason,
                    collected = collected.len(),
                    "history walk reached table boundary"
                );
                return Ok(WalkOutcome {
                    operations: collected,
                    stop_reason,
                    subject,
                    boundary: Some(record.id.clone()),
                });
            }
        }

        Ok(WalkOutcome {
            operations: collected,
            stop_reason: StopReason::Exhausted,
            subject,
            boundary: None,
        })
    }
}

struct Scan {
    subject: String,
    collected: Vec<TableOperation>,
    boundary: Option<StopReason>,
}

/// Scan one migration's operations, already in reverse order.
///
/// A rename of the subject switches to the name the table had before and
/// continues with the operations that precede the rename.
fn scan_migration(
    pending: &[&TableOperation],
    subject: String,
    mut collected: Vec<TableOperation>,
) -> Scan {
    for (i, op) in pending.iter().enumerate() {
        if !op.concerns(&subject) {
            continue;
        }

        match &op.operation {
            Operation::DropTable => {
                return Scan {
                    subject,
                    collected,
                    boundary: Some(StopReason::Dropped),
                };
            }
            Operation::RenameTable { .. } => {
                debug!(from = %subject, to = %op.table, "following table rename");
                return scan_migration(&pending[i + 1..], op.table.clone(), collected);
            }
            Operation::CreateTable { .. } => {
                collected.push((*op).clone());
                return Scan {
                    subject,
                    collected,
                    boundary: Some(StopReason::Created),
                };
            }
            _ => collected.push((*op).clone()),
        }
    }

    Scan {
        subject,
        collected,
        boundary: None,
    }
}
