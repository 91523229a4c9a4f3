//! Normalization of raw export tables into [`SupervisionRecord`]s.
//!
//! Pipeline per row:
//!   date cell      └─ parse_day_first()     → drop row when `None`
//!   code cell      └─ location_code()       → canonical string key
//!   region cell    └─ ReferenceData lookup  → canonical or raw
//!   supervisor     └─ ReferenceData lookup  → canonical or raw
//!   source kind    └─ fixed status and inspection kind

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use supervisa_core::{
  record::{InspectionKind, LocationCode, SupervisionRecord, SupervisionStatus},
  reference::{ReferenceData, Resolution},
};
use tracing::{debug, info, warn};

use crate::{
  error::{Error, Result},
  table::{Cell, RawTable, serial_to_date},
};

// ─── Source kinds ────────────────────────────────────────────────────────────

/// The three export layouts the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SourceKind {
  Fiscalizados,
  Prefiscalizados,
  FiscalizadosCmc,
}

/// Accepted header names for each output field, preferred spelling first.
struct ColumnMap {
  date:       &'static [&'static str],
  code:       &'static [&'static str],
  region:     &'static [&'static str],
  supervisor: &'static [&'static str],
}

impl SourceKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Fiscalizados => "Fiscalizados",
      Self::Prefiscalizados => "Prefiscalizados",
      Self::FiscalizadosCmc => "Fiscalizados CMC",
    }
  }

  pub fn status(&self) -> SupervisionStatus {
    match self {
      Self::Fiscalizados | Self::FiscalizadosCmc => SupervisionStatus::Fiscalizado,
      Self::Prefiscalizados => SupervisionStatus::Prefiscalizado,
    }
  }

  pub fn inspection_kind(&self) -> InspectionKind {
    match self {
      Self::FiscalizadosCmc => InspectionKind::Cmc,
      _ => InspectionKind::Normal,
    }
  }

  fn columns(&self) -> ColumnMap {
    match self {
      Self::Fiscalizados => ColumnMap {
        date:       &["Fecha"],
        code:       &["Código interno"],
        region:     &["Región", "Region"],
        supervisor: &["Nombre supervisor"],
      },
      Self::Prefiscalizados => ColumnMap {
        date:       &["Fecha"],
        code:       &["Numero Comercio"],
        region:     &["Region", "Región"],
        supervisor: &["Nombre Fiscalizador"],
      },
      Self::FiscalizadosCmc => ColumnMap {
        date:       &["Fecha"],
        code:       &["Numero Comercio"],
        region:     &["Region", "Región"],
        supervisor: &["Nombre"],
      },
    }
  }
}

impl fmt::Display for SourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SourceKind {
  type Err = Error;

  /// Case-insensitive; spaces, dashes and underscores are interchangeable.
  fn from_str(s: &str) -> Result<Self> {
    let key: String = s
      .trim()
      .chars()
      .filter(|c| !matches!(c, ' ' | '-' | '_'))
      .flat_map(char::to_lowercase)
      .collect();
    match key.as_str() {
      "fiscalizados" => Ok(Self::Fiscalizados),
      "prefiscalizados" => Ok(Self::Prefiscalizados),
      "fiscalizadoscmc" => Ok(Self::FiscalizadosCmc),
      _ => Err(Error::UnknownSourceKind(s.to_owned())),
    }
  }
}

// ─── Dates ───────────────────────────────────────────────────────────────────

const DAY_FIRST: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];
const YEAR_FIRST: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const SHORT_YEAR: &[&str] = &["%d/%m/%y", "%d-%m-%y"];

/// Parse a date cell, reading ambiguous text as day-first.
///
/// Spreadsheet dates and plain numbers are treated as serial day numbers.
/// Any time-of-day suffix is ignored.
pub fn parse_day_first(cell: &Cell) -> Option<NaiveDate> {
  match cell {
    Cell::Empty => None,
    Cell::Date(serial) | Cell::Number(serial) => serial_to_date(*serial),
    Cell::Text(s) => parse_date_text(s),
  }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
  let date_part = s.trim().split([' ', 'T']).next()?;
  if date_part.is_empty() {
    return None;
  }

  let full_year = DAY_FIRST
    .iter()
    .chain(YEAR_FIRST)
    .filter_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
    .find(|d| d.year() >= 1000);

  full_year.or_else(|| {
    SHORT_YEAR
      .iter()
      .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
  })
}

// ─── Normalizer ──────────────────────────────────────────────────────────────

/// Counters describing what normalization did to an input table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
  pub input_rows:           usize,
  pub dropped_dates:        usize,
  /// Raw region value → number of rows carrying it.
  pub unmapped_regions:     BTreeMap<String, usize>,
  /// Raw supervisor value → number of rows carrying it.
  pub unmapped_supervisors: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeOutput {
  pub records: Vec<SupervisionRecord>,
  pub report:  NormalizeReport,
}

/// Converts raw tables into canonical records using one set of reference
/// tables.
pub struct Normalizer<'a> {
  reference: &'a ReferenceData,
}

impl<'a> Normalizer<'a> {
  pub fn new(reference: &'a ReferenceData) -> Self { Self { reference } }

  /// Normalize every row of `table` as an export of kind `kind`.
  ///
  /// Fails only when a required column is missing. Rows without a usable
  /// date are dropped and counted.
  pub fn normalize(&self, table: &RawTable, kind: SourceKind) -> Result<NormalizeOutput> {
    let map = kind.columns();
    let kind_name = kind.as_str();
    let date_col = table.require_column(map.date, kind_name)?;
    let code_col = table.require_column(map.code, kind_name)?;
    let region_col = table.require_column(map.region, kind_name)?;
    let supervisor_col = table.require_column(map.supervisor, kind_name)?;

    let mut out = NormalizeOutput::default();
    out.report.input_rows = table.rows.len();

    for (idx, row) in table.rows.iter().enumerate() {
      let date_cell = RawTable::cell(row, date_col);
      let Some(date) = parse_day_first(date_cell) else {
        debug!(
          row = table.source_row(idx),
          value = ?date_cell,
          "dropping row without a usable date"
        );
        out.report.dropped_dates += 1;
        continue;
      };

      let raw_region = RawTable::cell(row, region_col).to_text();
      let region = match self.reference.resolve_region(&raw_region) {
        Resolution::Unmapped => {
          *out.report.unmapped_regions.entry(raw_region.clone()).or_default() += 1;
          raw_region
        }
        found => found.or_raw(&raw_region).to_owned(),
      };

      let raw_supervisor = RawTable::cell(row, supervisor_col).to_text();
      let supervisor = match self.reference.resolve_supervisor(&raw_supervisor) {
        Resolution::Unmapped => {
          *out
            .report
            .unmapped_supervisors
            .entry(raw_supervisor.clone())
            .or_default() += 1;
          raw_supervisor
        }
        found => found.or_raw(&raw_supervisor).to_owned(),
      };

      out.records.push(SupervisionRecord::new(
        date,
        location_code(RawTable::cell(row, code_col)),
        region,
        supervisor,
        kind.status(),
        kind.inspection_kind(),
      ));
    }

    for (value, count) in &out.report.unmapped_regions {
      warn!(region = %value, rows = count, "region not in reference data; kept as is");
    }
    for (value, count) in &out.report.unmapped_supervisors {
      warn!(supervisor = %value, rows = count, "supervisor not in reference data; kept as is");
    }
    info!(
      source = kind_name,
      input = out.report.input_rows,
      records = out.records.len(),
      dropped = out.report.dropped_dates,
      "normalized upload"
    );

    Ok(out)
  }
}

/// The canonical key for a code cell, whatever its type.
pub fn location_code(cell: &Cell) -> LocationCode {
  match cell {
    Cell::Number(n) | Cell::Date(n) => LocationCode::from_number(*n),
    other => LocationCode::new(other.to_text()),
  }
}
