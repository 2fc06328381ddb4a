//! Applied-migration history.
//!
//! The history store is an external collaborator; this module only orders
//! what it returns. Records come back newest first: apply time descending,
//! then canonical version token descending, then raw identifier descending,
//! both token comparisons ignoring ASCII case.

use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MigrateResult;

/// A raw row from the history store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Migration identifier.
    pub id: String,
    /// Apply time as a Unix timestamp.
    pub applied_at: i64,
}

impl HistoryEntry {
    /// Create a new history entry.
    pub fn new(id: impl Into<String>, applied_at: i64) -> Self {
        Self {
            id: id.into(),
            applied_at,
        }
    }
}

/// A record of an applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Migration identifier.
    pub id: String,
    /// Apply time as a Unix timestamp.
    pub applied_at: i64,
    /// Ordering key derived from the identifier.
    pub canonical_version: String,
}

impl MigrationRecord {
    /// Create a record, deriving its canonical version token.
    pub fn new(id: impl Into<String>, applied_at: i64) -> Self {
        let id = id.into();
        let canonical_version = canonical_version(&id);
        Self {
            id,
            applied_at,
            canonical_version,
        }
    }

    /// Apply time as a UTC date, when it is in range.
    pub fn applied_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.applied_at, 0)
    }
}

impl From<HistoryEntry> for MigrationRecord {
    fn from(entry: HistoryEntry) -> Self {
        Self::new(entry.id, entry.applied_at)
    }
}

static DATED_NAME: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"(?s)(\d{6}_?\d{6})(\D.*)?$").expect("dated name pattern is valid")
});

/// Derive the canonical version token of a migration identifier.
///
/// Identifiers following the dated naming convention
/// (`m240101_120000_create_orders`) yield their twelve timestamp digits;
/// anything else is its own token.
pub fn canonical_version(id: &str) -> String {
    match DATED_NAME.captures(id) {
        Some(caps) => caps[1].replace('_', ""),
        None => id.to_string(),
    }
}

fn cmp_ignore_ascii_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

/// Order two records newest first.
pub fn compare_records(a: &MigrationRecord, b: &MigrationRecord) -> Ordering {
    b.applied_at
        .cmp(&a.applied_at)
        .then_with(|| cmp_ignore_ascii_case(&b.canonical_version, &a.canonical_version))
        .then_with(|| cmp_ignore_ascii_case(&b.id, &a.id))
}

/// Storage of applied migrations.
pub trait HistoryStore {
    /// List applied migrations in any order.
    ///
    /// A store whose backing table does not exist returns an empty list.
    fn list(&self) -> MigrateResult<Vec<HistoryEntry>>;
}

impl<T: HistoryStore + ?Sized> HistoryStore for &T {
    fn list(&self) -> MigrateResult<Vec<HistoryEntry>> {
        (**self).list()
    }
}

impl<T: HistoryStore + ?Sized> HistoryStore for Box<T> {
    fn list(&self) -> MigrateResult<Vec<HistoryEntry>> {
        (**self).list()
    }
}

/// History kept in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    entries: Option<Vec<HistoryEntry>>,
}

impl InMemoryHistory {
    /// History whose storage has not been created yet.
    pub fn absent() -> Self {
        Self { entries: None }
    }

    /// History holding the given entries.
    pub fn new(entries: impl IntoIterator<Item = HistoryEntry>) -> Self {
        Self {
            entries: Some(entries.into_iter().collect()),
        }
    }

    /// Record another applied migration, creating the storage if needed.
    pub fn push(&mut self, id: impl Into<String>, applied_at: i64) {
        self.entries
            .get_or_insert_with(Vec::new)
            .push(HistoryEntry::new(id, applied_at));
    }

    /// Whether the storage exists.
    pub fn exists(&self) -> bool {
        self.entries.is_some()
    }
}

impl HistoryStore for InMemoryHistory {
    fn list(&self) -> MigrateResult<Vec<HistoryEntry>> {
        Ok(self.entries.clone().unwrap_or_default())
    }
}

/// Reads and orders applied-migration history.
pub struct HistoryReader<'a, H: ?Sized> {
    store: &'a H,
    base_migration: Option<&'a str>,
}

impl<'a, H: HistoryStore + ?Sized> HistoryReader<'a, H> {
    /// Create a reader over a history store.
    pub fn new(store: &'a H) -> Self {
        Self {
            store,
            base_migration: None,
        }
    }

    /// Skip the given bootstrap entry.
    pub fn skip_base(mut self, id: Option<&'a str>) -> Self {
        self.base_migration = id;
        self
    }

    /// Fetch applied migrations, newest first.
    ///
    /// An empty result means there is no history to replay.
    pub fn fetch(&self) -> MigrateResult<Vec<MigrationRecord>> {
        let mut records: Vec<MigrationRecord> = self
            .store
            .list()?
            .into_iter()
            .filter(|entry| Some(entry.id.as_str()) != self.base_migration)
            .map(MigrationRecord::from)
            .collect();

        records.sort_by(compare_records);

        tracing::debug!(count = records.len(), "fetched migration history");

        Ok(records)
    }
}
