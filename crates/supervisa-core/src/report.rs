//! Progress reporting over the unified view.
//!
//! Everything here is a pure computation over a slice of records; rendering
//! is left to the caller.

use std::{collections::HashMap, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  Error,
  record::{InspectionKind, Month, SupervisionRecord, SupervisionStatus},
  reference::ReferenceData,
};

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Record filter. Empty sets and absent bounds match everything.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
  pub supervisors: Vec<String>,
  pub regions:     Vec<String>,
  /// Inclusive lower bound.
  pub from:        Option<NaiveDate>,
  /// Inclusive upper bound.
  pub to:          Option<NaiveDate>,
}

impl RecordFilter {
  pub fn matches(&self, r: &SupervisionRecord) -> bool {
    (self.supervisors.is_empty() || self.supervisors.contains(&r.supervisor_name))
      && (self.regions.is_empty() || self.regions.contains(&r.region))
      && self.from.is_none_or(|from| r.date >= from)
      && self.to.is_none_or(|to| r.date <= to)
  }

  pub fn apply<'a>(&self, records: &'a [SupervisionRecord]) -> Vec<&'a SupervisionRecord> {
    records.iter().filter(|r| self.matches(r)).collect()
  }
}

// ─── Month selection ─────────────────────────────────────────────────────────

/// Either the whole campaign or a single month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum MonthSelection {
  #[default]
  Total,
  Month(Month),
}

impl MonthSelection {
  pub fn includes(&self, r: &SupervisionRecord) -> bool {
    match self {
      Self::Total => true,
      Self::Month(m) => r.month_label == *m,
    }
  }
}

impl fmt::Display for MonthSelection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Total => f.write_str("Total"),
      Self::Month(m) => f.write_str(m.as_str()),
    }
  }
}

impl FromStr for MonthSelection {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.trim().eq_ignore_ascii_case("total") {
      Ok(Self::Total)
    } else {
      s.parse().map(Self::Month)
    }
  }
}

// ─── Metrics ─────────────────────────────────────────────────────────────────

/// Headline counts for a month selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
  pub total:          usize,
  pub fiscalizado:    usize,
  pub prefiscalizado: usize,
  pub cmc:            usize,
}

pub fn metrics(records: &[&SupervisionRecord], selection: MonthSelection) -> Metrics {
  let mut m = Metrics::default();
  for r in records.iter().filter(|r| selection.includes(r)) {
    m.total += 1;
    match r.supervision_status {
      SupervisionStatus::Fiscalizado => m.fiscalizado += 1,
      SupervisionStatus::Prefiscalizado => m.prefiscalizado += 1,
    }
    if r.inspection_kind == InspectionKind::Cmc {
      m.cmc += 1;
    }
  }
  m
}

// ─── Goal progress ───────────────────────────────────────────────────────────

/// `min(achieved / goal * 100, 100)`, or 0 when there is no goal.
pub fn percentage(achieved: usize, goal: u32) -> f64 {
  if goal == 0 {
    return 0.0;
  }
  (achieved as f64 / goal as f64 * 100.0).min(100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionProgress {
  pub region:     String,
  pub goal:       u32,
  pub achieved:   usize,
  pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
  pub selection: MonthSelection,
  /// One row per canonical region, in reference order.
  pub regions:   Vec<RegionProgress>,
  pub total:     RegionProgress,
}

/// Fiscalizado counts against the goal table.
///
/// For a single month the goal is that month's target and only records of
/// that month count. For `Total` the goal is the sum over the campaign months
/// and every record counts.
pub fn goal_progress(
  records: &[&SupervisionRecord],
  reference: &ReferenceData,
  selection: MonthSelection,
) -> GoalProgress {
  let mut achieved: HashMap<&str, usize> = HashMap::new();
  for r in records
    .iter()
    .filter(|r| selection.includes(r))
    .filter(|r| r.supervision_status == SupervisionStatus::Fiscalizado)
  {
    *achieved.entry(r.region.as_str()).or_default() += 1;
  }

  let regions: Vec<RegionProgress> = reference
    .regions
    .iter()
    .map(|region| {
      let goal = match selection {
        MonthSelection::Total => reference.campaign_goal(region),
        MonthSelection::Month(m) => reference.goal(m, region),
      };
      let done = achieved.get(region.as_str()).copied().unwrap_or(0);
      RegionProgress {
        region: region.clone(),
        goal,
        achieved: done,
        percentage: percentage(done, goal),
      }
    })
    .collect();

  // Records from regions outside the reference list still count towards the
  // overall total.
  let total_goal: u32 = regions.iter().map(|r| r.goal).sum();
  let total_achieved: usize = achieved.values().sum();

  GoalProgress {
    selection,
    regions,
    total: RegionProgress {
      region:     "Total".to_owned(),
      goal:       total_goal,
      achieved:   total_achieved,
      percentage: percentage(total_achieved, total_goal),
    },
  }
}

// ─── Heatmap ─────────────────────────────────────────────────────────────────

/// Region × campaign-month matrix of goal percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
  pub months:  Vec<Month>,
  pub regions: Vec<String>,
  /// `cells[region][month]`, indexed like `regions` and `months`.
  pub cells:   Vec<Vec<f64>>,
}

pub fn heatmap(records: &[&SupervisionRecord], reference: &ReferenceData) -> Heatmap {
  let mut achieved: HashMap<(&str, Month), usize> = HashMap::new();
  for r in records
    .iter()
    .filter(|r| r.supervision_status == SupervisionStatus::Fiscalizado)
  {
    *achieved.entry((r.region.as_str(), r.month_label)).or_default() += 1;
  }

  let cells: Vec<Vec<f64>> = reference
    .regions
    .iter()
    .map(|region| {
      reference
        .campaign_months
        .iter()
        .map(|m| {
          let done = achieved.get(&(region.as_str(), *m)).copied().unwrap_or(0);
          percentage(done, reference.goal(*m, region))
        })
        .collect()
    })
    .collect();

  Heatmap {
    months: reference.campaign_months.clone(),
    regions: reference.regions.clone(),
    cells,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    ledger::tests::rec,
    record::SupervisionStatus::{Fiscalizado, Prefiscalizado},
  };

  fn in_region(mut r: SupervisionRecord, region: &str) -> SupervisionRecord {
    r.region = region.to_owned();
    r
  }

  #[test]
  fn percentage_is_capped_and_zero_safe() {
    assert_eq!(percentage(5, 10), 50.0);
    assert_eq!(percentage(30, 10), 100.0);
    assert_eq!(percentage(3, 0), 0.0);
  }

  #[test]
  fn filter_combines_criteria() {
    let mut other = rec("B002", (2024, 8, 20), Fiscalizado);
    other.supervisor_name = "CLAUDIO VERGARA".into();
    let records = vec![rec("A001", (2024, 7, 10), Fiscalizado), other];

    let f = RecordFilter {
      supervisors: vec!["ISABEL DIAZ".into()],
      ..Default::default()
    };
    assert_eq!(f.apply(&records).len(), 1);

    let f = RecordFilter {
      from: NaiveDate::from_ymd_opt(2024, 8, 1),
      to: NaiveDate::from_ymd_opt(2024, 8, 20),
      ..Default::default()
    };
    let hits = f.apply(&records);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].location_code.as_str(), "B002");
  }

  #[test]
  fn metrics_respect_month_selection() {
    let mut cmc = rec("C003", (2024, 8, 2), Fiscalizado);
    cmc.inspection_kind = InspectionKind::Cmc;
    let records = vec![
      rec("A001", (2024, 7, 1), Fiscalizado),
      rec("B002", (2024, 7, 2), Prefiscalizado),
      cmc,
    ];
    let all: Vec<&SupervisionRecord> = records.iter().collect();

    assert_eq!(metrics(&all, MonthSelection::Total), Metrics {
      total:          3,
      fiscalizado:    2,
      prefiscalizado: 1,
      cmc:            1,
    });
    assert_eq!(metrics(&all, MonthSelection::Month(Month::Julio)).total, 2);
  }

  #[test]
  fn monthly_progress_counts_fiscalizado_per_region() {
    let reference = ReferenceData::default();
    let records = vec![
      in_region(rec("A001", (2024, 7, 1), Fiscalizado), "ATACAMA"),
      in_region(rec("A002", (2024, 7, 2), Fiscalizado), "ATACAMA"),
      in_region(rec("A003", (2024, 7, 3), Prefiscalizado), "ATACAMA"),
      in_region(rec("A004", (2024, 8, 3), Fiscalizado), "ATACAMA"),
    ];
    let all: Vec<&SupervisionRecord> = records.iter().collect();

    let p = goal_progress(&all, &reference, MonthSelection::Month(Month::Julio));
    let atacama = p.regions.iter().find(|r| r.region == "ATACAMA").unwrap();
    assert_eq!(atacama.goal, 11);
    assert_eq!(atacama.achieved, 2);
    assert_eq!(p.regions.len(), 16);
    assert_eq!(p.total.achieved, 2);
    assert_eq!(p.total.goal, 1079);
  }

  #[test]
  fn total_progress_uses_campaign_goal() {
    let reference = ReferenceData::default();
    let records = vec![
      in_region(rec("A001", (2024, 7, 1), Fiscalizado), "ATACAMA"),
      in_region(rec("A002", (2024, 12, 2), Fiscalizado), "ATACAMA"),
    ];
    let all: Vec<&SupervisionRecord> = records.iter().collect();

    let p = goal_progress(&all, &reference, MonthSelection::Total);
    let atacama = p.regions.iter().find(|r| r.region == "ATACAMA").unwrap();
    // 11 + 11 + 7 + 11 + 7 + 4
    assert_eq!(atacama.goal, 51);
    assert_eq!(atacama.achieved, 2);
  }

  #[test]
  fn heatmap_cells_follow_reference_layout() {
    let reference = ReferenceData::default();
    let records: Vec<SupervisionRecord> = (0..20)
      .map(|i| in_region(rec(&format!("V{i}"), (2024, 10, 1), Fiscalizado), "VALPARAISO"))
      .collect();
    let all: Vec<&SupervisionRecord> = records.iter().collect();

    let h = heatmap(&all, &reference);
    assert_eq!(h.months.len(), 6);
    assert_eq!(h.cells.len(), 16);

    let row = h.regions.iter().position(|r| r == "VALPARAISO").unwrap();
    let col = h.months.iter().position(|m| *m == Month::Octubre).unwrap();
    // 20 of 78
    assert!((h.cells[row][col] - 20.0 / 78.0 * 100.0).abs() < 1e-9);
    assert_eq!(h.cells[row][0], 0.0);
  }

  #[test]
  fn month_selection_parses_total() {
    assert_eq!("total".parse::<MonthSelection>().unwrap(), MonthSelection::Total);
    assert_eq!(
      "Agosto".parse::<MonthSelection>().unwrap(),
      MonthSelection::Month(Month::Agosto)
    );
  }
}
