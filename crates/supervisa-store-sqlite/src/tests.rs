//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use supervisa_core::{
  pipeline,
  reconcile::AuthorityEntry,
  record::{InspectionKind, Month, SupervisionRecord, SupervisionStatus},
  roster::{RosterEntry, RosterStatus},
  store::{LedgerStore, RosterStore, Table, WriteBatch},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn rec(code: &str, day: u32, status: SupervisionStatus) -> SupervisionRecord {
  SupervisionRecord::new(
    NaiveDate::from_ymd_opt(2024, 9, day).unwrap(),
    code.into(),
    "DEL MAULE",
    "NICOLE ARAVENA",
    status,
    InspectionKind::Normal,
  )
}

fn codes(records: &[SupervisionRecord]) -> Vec<&str> {
  records.iter().map(|r| r.location_code.as_str()).collect()
}

// ─── Ledger tables ───────────────────────────────────────────────────────────

#[tokio::test]
async fn new_store_is_empty() {
  let s = store().await;
  for t in Table::UNIFIED_ORDER {
    assert!(s.load(t).await.unwrap().is_empty());
  }
  assert!(s.load_roster().await.unwrap().is_empty());
}

#[tokio::test]
async fn records_survive_a_round_trip() {
  let s = store().await;
  let mut cmc = rec("2002", 14, SupervisionStatus::Prefiscalizado);
  cmc.inspection_kind = InspectionKind::Cmc;
  cmc.region = "Isla de Pascua".into();
  let approved = rec("1001", 3, SupervisionStatus::Fiscalizado).approved();

  s.save(Table::Main, vec![approved.clone(), cmc.clone()]).await.unwrap();

  let loaded = s.load(Table::Main).await.unwrap();
  assert_eq!(loaded, vec![approved, cmc]);
  assert_eq!(loaded[1].month_label, Month::Septiembre);
}

#[tokio::test]
async fn append_preserves_insertion_order() {
  let s = store().await;
  s.append(Table::Staging, vec![rec("C", 1, SupervisionStatus::Fiscalizado)])
    .await
    .unwrap();
  s.append(Table::Staging, vec![
    rec("A", 2, SupervisionStatus::Fiscalizado),
    rec("B", 3, SupervisionStatus::Fiscalizado),
  ])
  .await
  .unwrap();

  assert_eq!(codes(&s.load(Table::Staging).await.unwrap()), vec!["C", "A", "B"]);
}

#[tokio::test]
async fn save_replaces_whole_table() {
  let s = store().await;
  s.append(Table::Flagged, vec![
    rec("A", 1, SupervisionStatus::Fiscalizado),
    rec("B", 1, SupervisionStatus::Fiscalizado),
  ])
  .await
  .unwrap();

  s.save(Table::Flagged, vec![rec("Z", 9, SupervisionStatus::Prefiscalizado)])
    .await
    .unwrap();
  assert_eq!(codes(&s.load(Table::Flagged).await.unwrap()), vec!["Z"]);

  s.save(Table::Flagged, vec![]).await.unwrap();
  assert!(s.load(Table::Flagged).await.unwrap().is_empty());
}

#[tokio::test]
async fn batch_touches_several_tables() {
  let s = store().await;
  s.append(Table::Staging, vec![
    rec("A", 1, SupervisionStatus::Fiscalizado),
    rec("B", 1, SupervisionStatus::Fiscalizado),
  ])
  .await
  .unwrap();

  s.apply(
    WriteBatch::new()
      .append(Table::Main, vec![rec("A", 1, SupervisionStatus::Fiscalizado).approved()])
      .replace(Table::Staging, vec![rec("B", 1, SupervisionStatus::Fiscalizado)]),
  )
  .await
  .unwrap();

  let main = s.load(Table::Main).await.unwrap();
  assert_eq!(codes(&main), vec!["A"]);
  assert!(main[0].approved);
  assert_eq!(codes(&s.load(Table::Staging).await.unwrap()), vec!["B"]);
}

#[tokio::test]
async fn failed_batch_leaves_every_table_unchanged() {
  let s = store().await;
  s.save(Table::Main, vec![rec("OLD", 1, SupervisionStatus::Fiscalizado).approved()])
    .await
    .unwrap();
  s.append(Table::Flagged, vec![rec("F1", 1, SupervisionStatus::Fiscalizado)])
    .await
    .unwrap();

  s.conn
    .call(|conn| {
      conn.execute_batch(
        "CREATE TRIGGER reject_flagged BEFORE INSERT ON ledger_flagged
         BEGIN SELECT RAISE(ABORT, 'flagged table is read-only'); END;",
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let result = s
    .apply(
      WriteBatch::new()
        .replace(Table::Main, vec![rec("NEW", 2, SupervisionStatus::Fiscalizado)])
        .append(Table::Flagged, vec![rec("F2", 2, SupervisionStatus::Fiscalizado)]),
    )
    .await;
  assert!(result.is_err());

  let main = s.load(Table::Main).await.unwrap();
  assert_eq!(codes(&main), vec!["OLD"]);
  assert!(main[0].approved);
  assert_eq!(codes(&s.load(Table::Flagged).await.unwrap()), vec!["F1"]);
}

#[tokio::test]
async fn data_persists_across_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("ledger.db");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.append(Table::Main, vec![rec("A", 1, SupervisionStatus::Fiscalizado)])
      .await
      .unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(codes(&s.load(Table::Main).await.unwrap()), vec!["A"]);
}

// ─── Roster ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn roster_is_replaced_and_ordered() {
  let s = store().await;
  s.save_roster(vec![RosterEntry::new("OLD")]).await.unwrap();

  let entries = vec![
    RosterEntry::new("1002").with_attribute("Comuna", "Talca"),
    RosterEntry::new("1001")
      .with_attribute("Comuna", "Curicó")
      .with_attribute("Dirección", "Merced 55"),
  ];
  s.save_roster(entries.clone()).await.unwrap();

  assert_eq!(s.load_roster().await.unwrap(), entries);
}

// ─── Pipeline over SQLite ────────────────────────────────────────────────────

#[tokio::test]
async fn promotion_only_grows_main_and_shrinks_staging() {
  let s = store().await;
  s.save(Table::Main, vec![rec("M001", 1, SupervisionStatus::Fiscalizado).approved()])
    .await
    .unwrap();
  pipeline::ingest_records(&s, vec![
    rec("S001", 5, SupervisionStatus::Fiscalizado),
    rec("S002", 6, SupervisionStatus::Prefiscalizado),
  ])
  .await
  .unwrap();

  let main_before = s.load(Table::Main).await.unwrap();
  let staging_before = s.load(Table::Staging).await.unwrap();

  pipeline::approve(&s, &[AuthorityEntry::new("S002", "Prefiscalizado")])
    .await
    .unwrap();

  let main_after = s.load(Table::Main).await.unwrap();
  let staging_after = s.load(Table::Staging).await.unwrap();
  assert!(main_before.iter().all(|r| main_after.contains(r)));
  assert!(staging_after.iter().all(|r| staging_before.contains(r)));
  assert_eq!(codes(&main_after), vec!["M001", "S002"]);
  assert_eq!(codes(&staging_after), vec!["S001"]);
}

#[tokio::test]
async fn ingest_approve_and_annotate() {
  let s = store().await;
  s.save_roster(vec![
    RosterEntry::new("A001"),
    RosterEntry::new("B002"),
    RosterEntry::new("C003"),
  ])
  .await
  .unwrap();

  let first = pipeline::ingest_records(&s, vec![
    rec("A001", 2, SupervisionStatus::Prefiscalizado),
    rec("B002", 2, SupervisionStatus::Fiscalizado),
  ])
  .await
  .unwrap();
  assert_eq!((first.staged, first.flagged), (2, 0));

  let authority = vec![
    AuthorityEntry::new("A001", "Fiscalizado"),
    AuthorityEntry::new("D004", "Fiscalizado"),
  ];
  let approval = pipeline::approve(&s, &authority).await.unwrap();
  assert_eq!(approval.promoted, 1);
  assert_eq!(approval.discrepancies.status_mismatch.len(), 1);
  assert_eq!(codes(&s.load(Table::Staging).await.unwrap()), vec!["B002"]);

  let second = pipeline::ingest_records(&s, vec![rec("A001", 20, SupervisionStatus::Fiscalizado)])
    .await
    .unwrap();
  assert_eq!((second.staged, second.flagged), (0, 1));

  let roster = pipeline::roster_status(&s).await.unwrap();
  let statuses: Vec<RosterStatus> = roster.iter().map(|a| a.status).collect();
  assert_eq!(statuses, vec![
    RosterStatus::Prefiscalizado,
    RosterStatus::Disponible,
    RosterStatus::Disponible,
  ]);
}
