//! The location roster and its annotation with the latest approved status.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

use crate::record::{LocationCode, SupervisionRecord, SupervisionStatus};

/// One location from the roster. Columns other than the code are carried
/// through untouched, in their original order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
  pub location_code: LocationCode,
  pub attributes:    Vec<(String, String)>,
}

impl RosterEntry {
  pub fn new(location_code: impl Into<LocationCode>) -> Self {
    Self {
      location_code: location_code.into(),
      attributes:    Vec::new(),
    }
  }

  pub fn with_attribute(
    mut self,
    name: impl Into<String>,
    value: impl Into<String>,
  ) -> Self {
    self.attributes.push((name.into(), value.into()));
    self
  }

  pub fn attribute(&self, name: &str) -> Option<&str> {
    self
      .attributes
      .iter()
      .find(|(k, _)| k == name)
      .map(|(_, v)| v.as_str())
  }
}

/// Status of a roster location as seen from `Main`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum RosterStatus {
  Fiscalizado,
  Prefiscalizado,
  /// No approved visit yet.
  Disponible,
}

impl RosterStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Fiscalizado => "Fiscalizado",
      Self::Prefiscalizado => "Prefiscalizado",
      Self::Disponible => "Disponible",
    }
  }
}

impl fmt::Display for RosterStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl From<SupervisionStatus> for RosterStatus {
  fn from(s: SupervisionStatus) -> Self {
    match s {
      SupervisionStatus::Fiscalizado => Self::Fiscalizado,
      SupervisionStatus::Prefiscalizado => Self::Prefiscalizado,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedRosterEntry {
  #[serde(flatten)]
  pub entry:  RosterEntry,
  pub status: RosterStatus,
}

/// Label every roster entry with the status of its most recent record in
/// `main`.
///
/// When several records share the latest date, the one appearing last in
/// `main` wins. Entries with no record are `Disponible`. Roster order is
/// preserved.
pub fn annotate_roster(
  roster: Vec<RosterEntry>,
  main: &[SupervisionRecord],
) -> Vec<AnnotatedRosterEntry> {
  let mut latest: HashMap<&LocationCode, &SupervisionRecord> = HashMap::new();
  for r in main {
    match latest.get(&r.location_code) {
      Some(prev) if prev.date > r.date => {}
      _ => {
        latest.insert(&r.location_code, r);
      }
    }
  }

  roster
    .into_iter()
    .map(|entry| {
      let status = latest
        .get(&entry.location_code)
        .map(|r| r.supervision_status.into())
        .unwrap_or(RosterStatus::Disponible);
      AnnotatedRosterEntry { entry, status }
    })
    .collect()
}

/// The annotated entries still marked `Disponible`.
pub fn available(annotated: &[AnnotatedRosterEntry]) -> Vec<&AnnotatedRosterEntry> {
  annotated
    .iter()
    .filter(|a| a.status == RosterStatus::Disponible)
    .collect()
}

/// Count of roster entries per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RosterSummary {
  pub fiscalizado:    usize,
  pub prefiscalizado: usize,
  pub disponible:     usize,
}

impl RosterSummary {
  pub fn of(annotated: &[AnnotatedRosterEntry]) -> Self {
    let mut s = Self::default();
    for a in annotated {
      match a.status {
        RosterStatus::Fiscalizado => s.fiscalizado += 1,
        RosterStatus::Prefiscalizado => s.prefiscalizado += 1,
        RosterStatus::Disponible => s.disponible += 1,
      }
    }
    s
  }

  pub fn total(&self) -> usize {
    self.fiscalizado + self.prefiscalizado + self.disponible
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    ledger::tests::rec,
    record::SupervisionStatus::{Fiscalizado, Prefiscalizado},
  };

  fn roster(codes: &[&str]) -> Vec<RosterEntry> {
    codes
      .iter()
      .map(|c| RosterEntry::new(*c).with_attribute("Comuna", "Copiapó"))
      .collect()
  }

  #[test]
  fn latest_visit_determines_status() {
    let main = vec![
      rec("A001", (2024, 9, 1), Fiscalizado),
      rec("A001", (2024, 7, 1), Prefiscalizado),
      rec("B002", (2024, 7, 1), Prefiscalizado),
    ];

    let out = annotate_roster(roster(&["A001", "B002", "C003"]), &main);
    let statuses: Vec<RosterStatus> = out.iter().map(|a| a.status).collect();
    assert_eq!(statuses, vec![
      RosterStatus::Fiscalizado,
      RosterStatus::Prefiscalizado,
      RosterStatus::Disponible,
    ]);
    assert_eq!(out[0].entry.attribute("Comuna"), Some("Copiapó"));
  }

  #[test]
  fn same_day_tie_takes_last_in_main_order() {
    let main = vec![
      rec("A001", (2024, 9, 1), Fiscalizado),
      rec("A001", (2024, 9, 1), Prefiscalizado),
    ];

    let out = annotate_roster(roster(&["A001"]), &main);
    assert_eq!(out[0].status, RosterStatus::Prefiscalizado);
  }

  #[test]
  fn available_and_summary() {
    let main = vec![rec("B002", (2024, 8, 1), Fiscalizado)];
    let out = annotate_roster(roster(&["A001", "B002", "C003"]), &main);

    let free: Vec<&str> = available(&out)
      .iter()
      .map(|a| a.entry.location_code.as_str())
      .collect();
    assert_eq!(free, vec!["A001", "C003"]);

    let summary = RosterSummary::of(&out);
    assert_eq!(summary.disponible, 2);
    assert_eq!(summary.fiscalizado, 1);
    assert_eq!(summary.total(), 3);
  }
}
