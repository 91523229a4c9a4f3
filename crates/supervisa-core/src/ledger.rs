//! The unified view over the three ledger tables.

use std::collections::{HashMap, HashSet};

use crate::{
  record::{LedgerKey, LocationCode, SupervisionRecord},
  store::{LedgerStore, Table},
};

/// Deduplicate `main ++ staging ++ flagged` by `(location_code, date)`.
///
/// Among duplicates the record encountered last wins. Surviving records keep
/// the position of that last occurrence, so the result is stable for a given
/// input.
pub fn unified_view(
  main: &[SupervisionRecord],
  staging: &[SupervisionRecord],
  flagged: &[SupervisionRecord],
) -> Vec<SupervisionRecord> {
  dedup_last(main.iter().chain(staging).chain(flagged))
}

/// Keep only the last record per `(location_code, date)`, in order.
pub fn dedup_last<'a>(
  records: impl IntoIterator<Item = &'a SupervisionRecord>,
) -> Vec<SupervisionRecord> {
  let all: Vec<&SupervisionRecord> = records.into_iter().collect();

  let mut last_index: HashMap<LedgerKey, usize> = HashMap::with_capacity(all.len());
  for (idx, r) in all.iter().enumerate() {
    last_index.insert(r.key(), idx);
  }

  all
    .iter()
    .enumerate()
    .filter(|(idx, r)| last_index.get(&r.key()) == Some(idx))
    .map(|(_, r)| (*r).clone())
    .collect()
}

/// The set of location codes present in `records`.
pub fn known_codes(records: &[SupervisionRecord]) -> HashSet<LocationCode> {
  records.iter().map(|r| r.location_code.clone()).collect()
}

/// Load all three tables from `store` and build the unified view.
pub async fn load_unified<S: LedgerStore>(
  store: &S,
) -> Result<Vec<SupervisionRecord>, S::Error> {
  let main = store.load(Table::Main).await?;
  let staging = store.load(Table::Staging).await?;
  let flagged = store.load(Table::Flagged).await?;
  Ok(unified_view(&main, &staging, &flagged))
}

#[cfg(test)]
pub(crate) mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::record::{InspectionKind, SupervisionStatus};

  pub(crate) fn rec(code: &str, ymd: (i32, u32, u32), status: SupervisionStatus) -> SupervisionRecord {
    SupervisionRecord::new(
      NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2).unwrap(),
      code.into(),
      "ATACAMA",
      "ISABEL DIAZ",
      status,
      InspectionKind::Normal,
    )
  }

  fn has_unique_keys(records: &[SupervisionRecord]) -> bool {
    let keys: HashSet<LedgerKey> = records.iter().map(|r| r.key()).collect();
    keys.len() == records.len()
  }

  #[test]
  fn later_tables_win_on_duplicate_keys() {
    let main = vec![rec("A001", (2024, 7, 1), SupervisionStatus::Fiscalizado)];
    let flagged = vec![rec("A001", (2024, 7, 1), SupervisionStatus::Prefiscalizado)];

    let view = unified_view(&main, &[], &flagged);
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].supervision_status, SupervisionStatus::Prefiscalizado);
  }

  #[test]
  fn same_code_on_different_dates_is_kept() {
    let main = vec![
      rec("A001", (2024, 7, 1), SupervisionStatus::Fiscalizado),
      rec("A001", (2024, 8, 1), SupervisionStatus::Fiscalizado),
    ];
    let staging = vec![rec("B002", (2024, 7, 3), SupervisionStatus::Prefiscalizado)];

    let view = unified_view(&main, &staging, &[]);
    assert_eq!(view.len(), 3);
    assert!(has_unique_keys(&view));
  }

  #[test]
  fn survivors_keep_position_of_last_occurrence() {
    let main = vec![
      rec("A001", (2024, 7, 1), SupervisionStatus::Fiscalizado),
      rec("B002", (2024, 7, 1), SupervisionStatus::Fiscalizado),
    ];
    let staging = vec![rec("A001", (2024, 7, 1), SupervisionStatus::Prefiscalizado)];

    let view = unified_view(&main, &staging, &[]);
    let codes: Vec<&str> = view.iter().map(|r| r.location_code.as_str()).collect();
    assert_eq!(codes, vec!["B002", "A001"]);
  }

  #[test]
  fn dedup_is_idempotent() {
    let main = vec![
      rec("A001", (2024, 7, 1), SupervisionStatus::Fiscalizado),
      rec("A001", (2024, 7, 1), SupervisionStatus::Prefiscalizado),
      rec("C003", (2024, 9, 2), SupervisionStatus::Fiscalizado),
    ];
    let staging = vec![
      rec("C003", (2024, 9, 2), SupervisionStatus::Prefiscalizado),
      rec("D004", (2024, 10, 5), SupervisionStatus::Fiscalizado),
    ];
    let flagged = vec![rec("D004", (2024, 10, 5), SupervisionStatus::Prefiscalizado)];

    let once = unified_view(&main, &staging, &flagged);
    let twice = unified_view(&once, &[], &[]);
    assert_eq!(once, twice);
    assert!(has_unique_keys(&once));
  }
}
