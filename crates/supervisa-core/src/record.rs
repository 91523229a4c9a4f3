//! Supervision records, the unit stored in every ledger table.
//!
//! A record is one inspection event at one location. Records are created by
//! the normalizer and never mutated afterwards; promotion produces a new
//! value with `approved` set.

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Location code ───────────────────────────────────────────────────────────

/// Canonical string key of a retail location.
///
/// Sources disagree on whether the code is a number or text, so it is always
/// held as a trimmed string.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LocationCode(String);

impl LocationCode {
  pub fn new(code: impl AsRef<str>) -> Self {
    Self(code.as_ref().trim().to_owned())
  }

  /// Build a code from a numeric spreadsheet cell. Integral values are
  /// rendered without a fractional part, so `1234.0` and `"1234"` compare
  /// equal.
  pub fn from_number(n: f64) -> Self {
    if n.fract() == 0.0 && n.abs() < 1e15 {
      Self(format!("{}", n as i64))
    } else {
      Self(n.to_string())
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl fmt::Display for LocationCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for LocationCode {
  fn from(s: &str) -> Self { Self::new(s) }
}

impl From<String> for LocationCode {
  fn from(s: String) -> Self { Self::new(s) }
}

// ─── Status and kind ─────────────────────────────────────────────────────────

/// Outcome recorded for a supervision visit.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum SupervisionStatus {
  /// Fully inspected.
  Fiscalizado,
  /// Lighter pre-inspection review.
  Prefiscalizado,
}

impl SupervisionStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Fiscalizado => "Fiscalizado",
      Self::Prefiscalizado => "Prefiscalizado",
    }
  }
}

impl fmt::Display for SupervisionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SupervisionStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "fiscalizado" => Ok(Self::Fiscalizado),
      "prefiscalizado" => Ok(Self::Prefiscalizado),
      _ => Err(Error::UnknownStatus(s.to_string())),
    }
  }
}

/// Inspection channel. CMC visits are tracked separately from normal ones.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum InspectionKind {
  Normal,
  #[serde(rename = "CMC")]
  Cmc,
}

impl InspectionKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Normal => "Normal",
      Self::Cmc => "CMC",
    }
  }
}

impl fmt::Display for InspectionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for InspectionKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "normal" => Ok(Self::Normal),
      "cmc" => Ok(Self::Cmc),
      _ => Err(Error::UnknownInspectionKind(s.to_string())),
    }
  }
}

// ─── Month ───────────────────────────────────────────────────────────────────

/// Calendar month, labelled in Spanish as in the source exports.
///
/// Ordering follows the calendar.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum Month {
  Enero,
  Febrero,
  Marzo,
  Abril,
  Mayo,
  Junio,
  Julio,
  Agosto,
  Septiembre,
  Octubre,
  Noviembre,
  Diciembre,
}

impl Month {
  pub const ALL: [Month; 12] = [
    Month::Enero,
    Month::Febrero,
    Month::Marzo,
    Month::Abril,
    Month::Mayo,
    Month::Junio,
    Month::Julio,
    Month::Agosto,
    Month::Septiembre,
    Month::Octubre,
    Month::Noviembre,
    Month::Diciembre,
  ];

  pub fn from_date(date: NaiveDate) -> Self {
    // `month0` is always in 0..12.
    Self::ALL[date.month0() as usize]
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Enero => "Enero",
      Self::Febrero => "Febrero",
      Self::Marzo => "Marzo",
      Self::Abril => "Abril",
      Self::Mayo => "Mayo",
      Self::Junio => "Junio",
      Self::Julio => "Julio",
      Self::Agosto => "Agosto",
      Self::Septiembre => "Septiembre",
      Self::Octubre => "Octubre",
      Self::Noviembre => "Noviembre",
      Self::Diciembre => "Diciembre",
    }
  }
}

impl fmt::Display for Month {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Month {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let wanted = s.trim();
    Self::ALL
      .into_iter()
      .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
      .ok_or_else(|| Error::UnknownMonth(s.to_string()))
  }
}

impl TryFrom<String> for Month {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<Month> for String {
  fn from(m: Month) -> Self { m.as_str().to_owned() }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// Key of a record across the unified view.
pub type LedgerKey = (LocationCode, NaiveDate);

/// One supervision visit in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisionRecord {
  pub date:               NaiveDate,
  pub location_code:      LocationCode,
  /// Canonical region name, or the raw value when no mapping exists.
  pub region:             String,
  /// Canonical supervisor name, or the raw value when no mapping exists.
  pub supervisor_name:    String,
  pub supervision_status: SupervisionStatus,
  /// Always `Month::from_date(date)`.
  pub month_label:        Month,
  pub inspection_kind:    InspectionKind,
  /// Set only when the record is promoted into `Main`.
  pub approved:           bool,
}

impl SupervisionRecord {
  /// Build an unapproved record; `month_label` is derived from `date`.
  pub fn new(
    date: NaiveDate,
    location_code: LocationCode,
    region: impl Into<String>,
    supervisor_name: impl Into<String>,
    supervision_status: SupervisionStatus,
    inspection_kind: InspectionKind,
  ) -> Self {
    Self {
      date,
      location_code,
      region: region.into(),
      supervisor_name: supervisor_name.into(),
      supervision_status,
      month_label: Month::from_date(date),
      inspection_kind,
      approved: false,
    }
  }

  pub fn key(&self) -> LedgerKey { (self.location_code.clone(), self.date) }

  /// The approved copy of this record, as written to `Main`.
  pub fn approved(self) -> Self { Self { approved: true, ..self } }
}
