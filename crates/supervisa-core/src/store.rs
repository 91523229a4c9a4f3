//! The `LedgerStore` and `RosterStore` traits.
//!
//! The traits are implemented by storage backends (e.g.
//! `supervisa-store-sqlite`). The pipeline and the CLI depend on this
//! abstraction, not on any concrete backend.

use std::{fmt, future::Future, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{record::SupervisionRecord, roster::RosterEntry};

// ─── Table names ─────────────────────────────────────────────────────────────

/// The three logical ledger tables.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Table {
  /// Approved, permanent records.
  Main,
  /// Records accepted on ingest and awaiting the authority list.
  Staging,
  /// Records rejected on ingest because their key was already known.
  Flagged,
}

impl Table {
  /// Concatenation order of the unified view.
  pub const UNIFIED_ORDER: [Table; 3] = [Table::Main, Table::Staging, Table::Flagged];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Main => "main",
      Self::Staging => "staging",
      Self::Flagged => "flagged",
    }
  }
}

impl fmt::Display for Table {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Table {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "main" => Ok(Self::Main),
      "staging" => Ok(Self::Staging),
      "flagged" => Ok(Self::Flagged),
      other => Err(format!("unknown table: {other:?}")),
    }
  }
}

// ─── Write batches ───────────────────────────────────────────────────────────

/// A single table write.
#[derive(Debug, Clone)]
pub enum TableWrite {
  /// Overwrite the whole table with these records.
  Replace(Table, Vec<SupervisionRecord>),
  /// Add these records after the existing content.
  Append(Table, Vec<SupervisionRecord>),
}

/// Writes that a backend must apply all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
  pub writes: Vec<TableWrite>,
}

impl WriteBatch {
  pub fn new() -> Self { Self::default() }

  pub fn replace(mut self, table: Table, records: Vec<SupervisionRecord>) -> Self {
    self.writes.push(TableWrite::Replace(table, records));
    self
  }

  pub fn append(mut self, table: Table, records: Vec<SupervisionRecord>) -> Self {
    self.writes.push(TableWrite::Append(table, records));
    self
  }

  pub fn is_empty(&self) -> bool { self.writes.is_empty() }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Abstraction over the keyed ledger tables.
///
/// Backends only need `load` and `apply`; `save` and `append` are expressed
/// as single-write batches. A batch either lands completely or leaves every
/// table as it was.
pub trait LedgerStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All records of `table`, in insertion order.
  fn load(
    &self,
    table: Table,
  ) -> impl Future<Output = Result<Vec<SupervisionRecord>, Self::Error>> + Send + '_;

  /// Apply every write in `batch` atomically, in order.
  fn apply(
    &self,
    batch: WriteBatch,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace the whole content of `table`.
  fn save(
    &self,
    table: Table,
    records: Vec<SupervisionRecord>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_ {
    self.apply(WriteBatch::new().replace(table, records))
  }

  /// Add `records` after the current content of `table`.
  fn append(
    &self,
    table: Table,
    records: Vec<SupervisionRecord>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_ {
    self.apply(WriteBatch::new().append(table, records))
  }
}

/// Abstraction over the static location roster.
pub trait RosterStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The roster in its stored order.
  fn load_roster(
    &self,
  ) -> impl Future<Output = Result<Vec<RosterEntry>, Self::Error>> + Send + '_;

  /// Replace the whole roster.
  fn save_roster(
    &self,
    entries: Vec<RosterEntry>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
