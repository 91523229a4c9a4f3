//! [`SqliteStore`], the SQLite implementation of [`LedgerStore`] and
//! [`RosterStore`].

use std::path::Path;

use rusqlite::TransactionBehavior;
use supervisa_core::{
  record::SupervisionRecord,
  roster::RosterEntry,
  store::{LedgerStore, RosterStore, Table, TableWrite, WriteBatch},
};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{EncodedRecord, RawRecord, RawRosterEntry, encode_attributes, table_name},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A supervision ledger backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

/// A [`TableWrite`] with its records already encoded for binding.
struct EncodedWrite {
  table:   &'static str,
  replace: bool,
  records: Vec<EncodedRecord>,
}

impl From<TableWrite> for EncodedWrite {
  fn from(w: TableWrite) -> Self {
    let (table, replace, records) = match w {
      TableWrite::Replace(t, records) => (t, true, records),
      TableWrite::Append(t, records) => (t, false, records),
    };
    Self {
      table: table_name(table),
      replace,
      records: records.iter().map(EncodedRecord::from).collect(),
    }
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── LedgerStore impl ────────────────────────────────────────────────────────

impl LedgerStore for SqliteStore {
  type Error = Error;

  async fn load(&self, table: Table) -> Result<Vec<SupervisionRecord>> {
    let name = table_name(table);

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT date, location_code, region, supervisor_name,
                  supervision_status, month_label, inspection_kind, approved
           FROM {name}
           ORDER BY position"
        ))?;
        let rows = stmt
          .query_map([], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn apply(&self, batch: WriteBatch) -> Result<()> {
    if batch.is_empty() {
      return Ok(());
    }
    let writes: Vec<EncodedWrite> =
      batch.writes.into_iter().map(EncodedWrite::from).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        for w in &writes {
          let start: i64 = if w.replace {
            tx.execute(&format!("DELETE FROM {}", w.table), [])?;
            0
          } else {
            tx.query_row(
              &format!("SELECT COALESCE(MAX(position) + 1, 0) FROM {}", w.table),
              [],
              |r| r.get(0),
            )?
          };

          let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} (
               position, date, location_code, region, supervisor_name,
               supervision_status, month_label, inspection_kind, approved
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            w.table
          ))?;
          for (offset, r) in w.records.iter().enumerate() {
            stmt.execute(rusqlite::params![
              start + offset as i64,
              r.date,
              r.location_code,
              r.region,
              r.supervisor_name,
              r.supervision_status,
              r.month_label,
              r.inspection_kind,
              r.approved,
            ])?;
          }
          debug!(
            table = w.table,
            replace = w.replace,
            rows = w.records.len(),
            "wrote ledger rows"
          );
        }

        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RosterStore impl ────────────────────────────────────────────────────────

impl RosterStore for SqliteStore {
  type Error = Error;

  async fn load_roster(&self) -> Result<Vec<RosterEntry>> {
    let raws: Vec<RawRosterEntry> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT location_code, attributes_json FROM roster ORDER BY position",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawRosterEntry {
              location_code:   row.get(0)?,
              attributes_json: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRosterEntry::into_entry).collect()
  }

  async fn save_roster(&self, entries: Vec<RosterEntry>) -> Result<()> {
    let encoded: Vec<(String, String)> = entries
      .iter()
      .map(|e| -> Result<(String, String)> {
        Ok((e.location_code.to_string(), encode_attributes(&e.attributes)?))
      })
      .collect::<Result<_>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM roster", [])?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO roster (position, location_code, attributes_json)
             VALUES (?1, ?2, ?3)",
          )?;
          for (position, (code, attrs)) in encoded.iter().enumerate() {
            stmt.execute(rusqlite::params![position as i64, code, attrs])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
