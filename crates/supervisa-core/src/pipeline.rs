//! Store-generic operations that combine the pure reconciliation rules with
//! persistence.
//!
//! Each operation reads what it needs, computes, and hands the store a single
//! [`WriteBatch`] so that a failure never leaves the tables half updated.

use serde::Serialize;
use tracing::{debug, info};

use crate::{
  ledger::load_unified,
  reconcile::{self, AuthorityEntry, Discrepancies, IngestPartition},
  record::SupervisionRecord,
  roster::{AnnotatedRosterEntry, annotate_roster},
  store::{LedgerStore, RosterStore, Table, WriteBatch},
};

// ─── Ingest ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
  pub staged:  usize,
  pub flagged: usize,
}

impl IngestOutcome {
  /// The upload contained no records at all; nothing was written.
  pub fn is_noop(&self) -> bool { self.staged == 0 && self.flagged == 0 }
}

impl From<&IngestPartition> for IngestOutcome {
  fn from(p: &IngestPartition) -> Self {
    Self {
      staged:  p.to_stage.len(),
      flagged: p.to_flag.len(),
    }
  }
}

/// Classify `records` against the unified view and append them to `Staging`
/// and `Flagged` in one batch.
pub async fn ingest_records<S: LedgerStore>(
  store: &S,
  records: Vec<SupervisionRecord>,
) -> Result<IngestOutcome, S::Error> {
  let unified = load_unified(store).await?;
  debug!(unified = unified.len(), incoming = records.len(), "classifying upload");

  let partition = reconcile::ingest(records, &unified);
  let outcome = IngestOutcome::from(&partition);
  if partition.is_noop() {
    info!("upload contained no records; nothing written");
    return Ok(outcome);
  }

  store
    .apply(
      WriteBatch::new()
        .append(Table::Staging, partition.to_stage)
        .append(Table::Flagged, partition.to_flag),
    )
    .await?;

  info!(staged = outcome.staged, flagged = outcome.flagged, "ingest complete");
  Ok(outcome)
}

// ─── Compare and approve ─────────────────────────────────────────────────────

/// Compare the current `Staging` table against `authority`. Read-only.
pub async fn compare<S: LedgerStore>(
  store: &S,
  authority: &[AuthorityEntry],
) -> Result<Discrepancies, S::Error> {
  let staging = store.load(Table::Staging).await?;
  let d = reconcile::reconcile_with_authority(&staging, authority);
  info!(
    unauthorized = d.unauthorized.len(),
    missing = d.missing_from_staging.len(),
    mismatched = d.status_mismatch.len(),
    "comparison complete"
  );
  Ok(d)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApprovalOutcome {
  /// Discrepancies as they stood before promotion.
  pub discrepancies: Discrepancies,
  pub promoted:      usize,
  pub remaining:     usize,
}

/// Promote every staged record whose code appears in `authority` into
/// `Main`, and drop it from `Staging`.
pub async fn approve<S: LedgerStore>(
  store: &S,
  authority: &[AuthorityEntry],
) -> Result<ApprovalOutcome, S::Error> {
  let staging = store.load(Table::Staging).await?;
  let discrepancies = reconcile::reconcile_with_authority(&staging, authority);
  let promotion = reconcile::promote(staging, authority);

  let outcome = ApprovalOutcome {
    discrepancies,
    promoted: promotion.promoted.len(),
    remaining: promotion.remaining_staging.len(),
  };

  if outcome.promoted > 0 {
    store
      .apply(
        WriteBatch::new()
          .append(Table::Main, promotion.promoted)
          .replace(Table::Staging, promotion.remaining_staging),
      )
      .await?;
  }

  info!(
    promoted = outcome.promoted,
    remaining = outcome.remaining,
    "approval complete"
  );
  Ok(outcome)
}

// ─── Roster ──────────────────────────────────────────────────────────────────

/// The roster annotated with the latest approved status of each location.
pub async fn roster_status<S>(
  store: &S,
) -> Result<Vec<AnnotatedRosterEntry>, <S as LedgerStore>::Error>
where
  S: LedgerStore + RosterStore<Error = <S as LedgerStore>::Error>,
{
  let roster = store.load_roster().await?;
  let main = store.load(Table::Main).await?;
  Ok(annotate_roster(roster, &main))
}

#[cfg(test)]
mod tests {
  use std::{convert::Infallible, sync::Mutex};

  use super::*;
  use crate::{
    ledger::tests::rec,
    record::SupervisionStatus::{Fiscalizado, Prefiscalizado},
    roster::{RosterEntry, RosterStatus},
    store::TableWrite,
  };

  #[derive(Default)]
  struct MemoryStore {
    main:    Mutex<Vec<SupervisionRecord>>,
    staging: Mutex<Vec<SupervisionRecord>>,
    flagged: Mutex<Vec<SupervisionRecord>>,
    roster:  Mutex<Vec<RosterEntry>>,
  }

  impl MemoryStore {
    fn table(&self, t: Table) -> &Mutex<Vec<SupervisionRecord>> {
      match t {
        Table::Main => &self.main,
        Table::Staging => &self.staging,
        Table::Flagged => &self.flagged,
      }
    }

    fn codes(&self, t: Table) -> Vec<String> {
      self
        .table(t)
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.location_code.to_string())
        .collect()
    }
  }

  impl LedgerStore for MemoryStore {
    type Error = Infallible;

    async fn load(&self, table: Table) -> Result<Vec<SupervisionRecord>, Self::Error> {
      Ok(self.table(table).lock().unwrap().clone())
    }

    async fn apply(&self, batch: WriteBatch) -> Result<(), Self::Error> {
      for write in batch.writes {
        match write {
          TableWrite::Replace(t, records) => *self.table(t).lock().unwrap() = records,
          TableWrite::Append(t, records) => self.table(t).lock().unwrap().extend(records),
        }
      }
      Ok(())
    }
  }

  impl RosterStore for MemoryStore {
    type Error = Infallible;

    async fn load_roster(&self) -> Result<Vec<RosterEntry>, Self::Error> {
      Ok(self.roster.lock().unwrap().clone())
    }

    async fn save_roster(&self, entries: Vec<RosterEntry>) -> Result<(), Self::Error> {
      *self.roster.lock().unwrap() = entries;
      Ok(())
    }
  }

  #[tokio::test]
  async fn first_upload_is_staged() {
    let store = MemoryStore::default();
    let out = ingest_records(&store, vec![
      rec("A001", (2024, 7, 1), Fiscalizado),
      rec("B002", (2024, 7, 2), Prefiscalizado),
    ])
    .await
    .unwrap();

    assert_eq!(out, IngestOutcome { staged: 2, flagged: 0 });
    assert_eq!(store.codes(Table::Staging), vec!["A001", "B002"]);
    assert!(store.codes(Table::Flagged).is_empty());
  }

  #[tokio::test]
  async fn reupload_is_flagged() {
    let store = MemoryStore::default();
    let upload = vec![rec("A001", (2024, 7, 1), Fiscalizado)];
    ingest_records(&store, upload.clone()).await.unwrap();

    let out = ingest_records(&store, upload).await.unwrap();
    assert_eq!(out, IngestOutcome { staged: 0, flagged: 1 });
    assert_eq!(store.codes(Table::Staging), vec!["A001"]);
    assert_eq!(store.codes(Table::Flagged), vec!["A001"]);
  }

  #[tokio::test]
  async fn empty_upload_writes_nothing() {
    let store = MemoryStore::default();
    let out = ingest_records(&store, vec![]).await.unwrap();
    assert!(out.is_noop());
  }

  #[tokio::test]
  async fn approval_moves_authorized_records_to_main() {
    let store = MemoryStore::default();
    ingest_records(&store, vec![
      rec("A001", (2024, 7, 1), Prefiscalizado),
      rec("B002", (2024, 7, 2), Fiscalizado),
    ])
    .await
    .unwrap();
    let authority = vec![AuthorityEntry::new("A001", "Fiscalizado")];

    let d = compare(&store, &authority).await.unwrap();
    assert_eq!(d.status_mismatch.len(), 1);
    assert_eq!(d.unauthorized.len(), 1);

    let out = approve(&store, &authority).await.unwrap();
    assert_eq!(out.promoted, 1);
    assert_eq!(out.remaining, 1);
    assert_eq!(store.codes(Table::Main), vec!["A001"]);
    assert_eq!(store.codes(Table::Staging), vec!["B002"]);
    assert!(store.main.lock().unwrap()[0].approved);

    // Promoted codes stay known to later ingests.
    let again = ingest_records(&store, vec![rec("A001", (2024, 8, 1), Fiscalizado)])
      .await
      .unwrap();
    assert_eq!(again.flagged, 1);
  }

  #[tokio::test]
  async fn approval_never_removes_main_or_adds_to_staging() {
    let store = MemoryStore::default();
    *store.main.lock().unwrap() = vec![rec("OLD1", (2024, 6, 3), Fiscalizado).approved()];
    ingest_records(&store, vec![
      rec("A001", (2024, 7, 1), Fiscalizado),
      rec("B002", (2024, 7, 2), Prefiscalizado),
    ])
    .await
    .unwrap();
    let main_before = store.load(Table::Main).await.unwrap();
    let staging_before = store.load(Table::Staging).await.unwrap();

    approve(&store, &[AuthorityEntry::new("B002", "Prefiscalizado")])
      .await
      .unwrap();

    let main_after = store.load(Table::Main).await.unwrap();
    let staging_after = store.load(Table::Staging).await.unwrap();
    assert!(main_before.iter().all(|r| main_after.contains(r)));
    assert!(staging_after.iter().all(|r| staging_before.contains(r)));
    assert_eq!(store.codes(Table::Main), vec!["OLD1", "B002"]);
    assert_eq!(store.codes(Table::Staging), vec!["A001"]);
  }

  #[tokio::test]
  async fn approval_without_matches_leaves_tables_alone() {
    let store = MemoryStore::default();
    ingest_records(&store, vec![rec("A001", (2024, 7, 1), Fiscalizado)])
      .await
      .unwrap();

    let out = approve(&store, &[AuthorityEntry::new("Z999", "Fiscalizado")])
      .await
      .unwrap();
    assert_eq!(out.promoted, 0);
    assert_eq!(out.discrepancies.missing_from_staging.len(), 1);
    assert_eq!(store.codes(Table::Staging), vec!["A001"]);
    assert!(store.codes(Table::Main).is_empty());
  }

  #[tokio::test]
  async fn roster_reflects_main_only() {
    let store = MemoryStore::default();
    store
      .save_roster(vec![RosterEntry::new("A001"), RosterEntry::new("B002")])
      .await
      .unwrap();
    ingest_records(&store, vec![
      rec("A001", (2024, 7, 1), Fiscalizado),
      rec("B002", (2024, 7, 1), Fiscalizado),
    ])
    .await
    .unwrap();
    approve(&store, &[AuthorityEntry::new("A001", "Fiscalizado")])
      .await
      .unwrap();

    let annotated = roster_status(&store).await.unwrap();
    let statuses: Vec<RosterStatus> = annotated.iter().map(|a| a.status).collect();
    assert_eq!(statuses, vec![RosterStatus::Fiscalizado, RosterStatus::Disponible]);
  }
}
