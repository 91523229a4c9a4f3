//! The reconciliation engine: ingest classification, comparison against the
//! authority list, and promotion.
//!
//! All functions here are pure. Persisting their results is the job of
//! [`crate::pipeline`].
//!
//! Promotion and the discrepancy report are separate rules: a record whose
//! status disagrees with the authority list is reported as a mismatch and
//! still promoted, since promotion only checks key membership (see
//! [`is_promotable`]).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
  ledger::known_codes,
  record::{LocationCode, SupervisionRecord, SupervisionStatus},
};

// ─── Ingest ──────────────────────────────────────────────────────────────────

/// Result of classifying freshly normalized records against the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestPartition {
  /// Unseen codes, one record per code (last occurrence in input order).
  pub to_stage: Vec<SupervisionRecord>,
  /// Records whose code already exists in the unified view, kept verbatim.
  pub to_flag:  Vec<SupervisionRecord>,
}

impl IngestPartition {
  /// Nothing new and nothing duplicated.
  pub fn is_noop(&self) -> bool {
    self.to_stage.is_empty() && self.to_flag.is_empty()
  }
}

/// Split `new_records` by whether their `location_code` already appears in
/// `unified`.
///
/// Matching is on the code alone, not on `(code, date)`: a location that has
/// any recorded visit is considered known.
pub fn ingest(
  new_records: Vec<SupervisionRecord>,
  unified: &[SupervisionRecord],
) -> IngestPartition {
  let known = known_codes(unified);

  let (fresh, to_flag): (Vec<_>, Vec<_>) = new_records
    .into_iter()
    .partition(|r| !known.contains(&r.location_code));

  IngestPartition {
    to_stage: dedup_by_code_keep_last(fresh),
    to_flag,
  }
}

/// Keep the last record for each code, ordered by that last occurrence.
fn dedup_by_code_keep_last(records: Vec<SupervisionRecord>) -> Vec<SupervisionRecord> {
  let mut last: HashMap<LocationCode, usize> = HashMap::with_capacity(records.len());
  for (idx, r) in records.iter().enumerate() {
    last.insert(r.location_code.clone(), idx);
  }

  records
    .into_iter()
    .enumerate()
    .filter(|(idx, r)| last.get(&r.location_code) == Some(idx))
    .map(|(_, r)| r)
    .collect()
}

// ─── Authority list ──────────────────────────────────────────────────────────

/// One row of the client-supplied approval list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityEntry {
  pub location_code:      LocationCode,
  /// Status as written by the client. Not restricted to the known labels so
  /// that unexpected values surface as mismatches instead of parse errors.
  pub supervision_status: String,
}

impl AuthorityEntry {
  pub fn new(code: impl Into<LocationCode>, status: impl Into<String>) -> Self {
    Self {
      location_code:      code.into(),
      supervision_status: status.into(),
    }
  }

  /// Whether the client status is exactly the label of `status`. Case
  /// differences count as disagreement; only surrounding whitespace is
  /// ignored.
  pub fn agrees_with(&self, status: SupervisionStatus) -> bool {
    self.supervision_status.trim() == status.as_str()
  }
}

/// The set of codes in the authority list.
pub fn authority_codes(authority: &[AuthorityEntry]) -> HashSet<&LocationCode> {
  authority.iter().map(|a| &a.location_code).collect()
}

// ─── Discrepancies ───────────────────────────────────────────────────────────

/// A code present on both sides with a different status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMismatch {
  pub location_code:    LocationCode,
  pub staging_status:   SupervisionStatus,
  pub authority_status: String,
}

/// Comparison of `Staging` against the authority list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Discrepancies {
  /// Staged but never confirmed by the authority, in staging order.
  pub unauthorized:         Vec<LocationCode>,
  /// Expected by the authority but never received, in authority order.
  pub missing_from_staging: Vec<LocationCode>,
  /// Present on both sides with conflicting status, in staging order.
  pub status_mismatch:      Vec<StatusMismatch>,
}

impl Discrepancies {
  pub fn is_empty(&self) -> bool {
    self.unauthorized.is_empty()
      && self.missing_from_staging.is_empty()
      && self.status_mismatch.is_empty()
  }
}

/// Compare `staging` against `authority`.
///
/// Each code is reported once. When a code appears several times on either
/// side, the first row in input order is the one compared.
pub fn reconcile_with_authority(
  staging: &[SupervisionRecord],
  authority: &[AuthorityEntry],
) -> Discrepancies {
  let first_staged = first_by_code(staging.iter().map(|r| (&r.location_code, r)));
  let first_authorized = first_by_code(authority.iter().map(|a| (&a.location_code, a)));

  let mut out = Discrepancies::default();

  for (code, record) in &first_staged.ordered {
    match first_authorized.by_code.get(code) {
      None => out.unauthorized.push((*code).clone()),
      Some(entry) if !entry.agrees_with(record.supervision_status) => {
        out.status_mismatch.push(StatusMismatch {
          location_code:    (*code).clone(),
          staging_status:   record.supervision_status,
          authority_status: entry.supervision_status.trim().to_owned(),
        });
      }
      Some(_) => {}
    }
  }

  for (code, _) in &first_authorized.ordered {
    if !first_staged.by_code.contains_key(code) {
      out.missing_from_staging.push((*code).clone());
    }
  }

  out
}

/// First occurrence per code, with the order in which codes first appeared.
struct FirstByCode<'a, T> {
  ordered: Vec<(&'a LocationCode, &'a T)>,
  by_code: HashMap<&'a LocationCode, &'a T>,
}

fn first_by_code<'a, T>(
  rows: impl Iterator<Item = (&'a LocationCode, &'a T)>,
) -> FirstByCode<'a, T> {
  let mut ordered = Vec::new();
  let mut by_code = HashMap::new();
  for (code, row) in rows {
    if !by_code.contains_key(code) {
      by_code.insert(code, row);
      ordered.push((code, row));
    }
  }
  FirstByCode { ordered, by_code }
}

// ─── Promotion ───────────────────────────────────────────────────────────────

/// Result of moving approved records out of `Staging`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Promotion {
  /// Approved copies of the promoted records, in staging order.
  pub promoted:          Vec<SupervisionRecord>,
  /// Staging minus every promoted record, in staging order.
  pub remaining_staging: Vec<SupervisionRecord>,
}

/// The promotion rule: a staged record is promoted iff its code is in the
/// authority list. Status agreement is not required.
pub fn is_promotable(
  record: &SupervisionRecord,
  authorized: &HashSet<&LocationCode>,
) -> bool {
  authorized.contains(&record.location_code)
}

/// Split `staging` into promoted and remaining records.
pub fn promote(
  staging: Vec<SupervisionRecord>,
  authority: &[AuthorityEntry],
) -> Promotion {
  let authorized = authority_codes(authority);

  let (promoted, remaining_staging): (Vec<_>, Vec<_>) = staging
    .into_iter()
    .partition(|r| is_promotable(r, &authorized));

  Promotion {
    promoted: promoted.into_iter().map(SupervisionRecord::approved).collect(),
    remaining_staging,
  }
}
