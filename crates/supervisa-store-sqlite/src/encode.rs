//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD`. Enums are stored as their canonical
//! labels. Roster attributes are stored as compact JSON.

use chrono::NaiveDate;
use supervisa_core::{
  record::{InspectionKind, LocationCode, Month, SupervisionRecord, SupervisionStatus},
  roster::RosterEntry,
  store::Table,
};

use crate::{Error, Result};

// ─── Table names ─────────────────────────────────────────────────────────────

pub fn table_name(t: Table) -> &'static str {
  match t {
    Table::Main => "ledger_main",
    Table::Staging => "ledger_staging",
    Table::Flagged => "ledger_flagged",
  }
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("invalid date {s:?}: {e}")))
}

// ─── Roster attributes ───────────────────────────────────────────────────────

pub fn encode_attributes(attrs: &[(String, String)]) -> Result<String> {
  Ok(serde_json::to_string(attrs)?)
}

pub fn decode_attributes(s: &str) -> Result<Vec<(String, String)>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// Column values of one ledger row, ready to bind.
pub struct EncodedRecord {
  pub date:               String,
  pub location_code:      String,
  pub region:             String,
  pub supervisor_name:    String,
  pub supervision_status: &'static str,
  pub month_label:        &'static str,
  pub inspection_kind:    &'static str,
  pub approved:           bool,
}

impl From<&SupervisionRecord> for EncodedRecord {
  fn from(r: &SupervisionRecord) -> Self {
    Self {
      date:               encode_date(r.date),
      location_code:      r.location_code.to_string(),
      region:             r.region.clone(),
      supervisor_name:    r.supervisor_name.clone(),
      supervision_status: r.supervision_status.as_str(),
      month_label:        r.month_label.as_str(),
      inspection_kind:    r.inspection_kind.as_str(),
      approved:           r.approved,
    }
  }
}

/// A ledger row as read from SQLite, before decoding.
pub struct RawRecord {
  pub date:               String,
  pub location_code:      String,
  pub region:             String,
  pub supervisor_name:    String,
  pub supervision_status: String,
  pub month_label:        String,
  pub inspection_kind:    String,
  pub approved:           bool,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      date:               row.get(0)?,
      location_code:      row.get(1)?,
      region:             row.get(2)?,
      supervisor_name:    row.get(3)?,
      supervision_status: row.get(4)?,
      month_label:        row.get(5)?,
      inspection_kind:    row.get(6)?,
      approved:           row.get(7)?,
    })
  }

  pub fn into_record(self) -> Result<SupervisionRecord> {
    Ok(SupervisionRecord {
      date:               decode_date(&self.date)?,
      location_code:      LocationCode::new(self.location_code),
      region:             self.region,
      supervisor_name:    self.supervisor_name,
      supervision_status: self.supervision_status.parse::<SupervisionStatus>()?,
      month_label:        self.month_label.parse::<Month>()?,
      inspection_kind:    self.inspection_kind.parse::<InspectionKind>()?,
      approved:           self.approved,
    })
  }
}

pub struct RawRosterEntry {
  pub location_code:   String,
  pub attributes_json: String,
}

impl RawRosterEntry {
  pub fn into_entry(self) -> Result<RosterEntry> {
    Ok(RosterEntry {
      location_code: LocationCode::new(self.location_code),
      attributes:    decode_attributes(&self.attributes_json)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bad_stored_date_is_a_decode_error() {
    assert!(matches!(decode_date("15/08/2024"), Err(Error::Decode(_))));
    assert_eq!(
      decode_date("2024-08-15").unwrap(),
      NaiveDate::from_ymd_opt(2024, 8, 15).unwrap()
    );
  }

  #[test]
  fn attributes_keep_order() {
    let attrs = vec![
      ("Zona".to_string(), "Norte".to_string()),
      ("Comuna".to_string(), "Arica".to_string()),
    ];
    let json = encode_attributes(&attrs).unwrap();
    assert_eq!(json, r#"[["Zona","Norte"],["Comuna","Arica"]]"#);
    assert_eq!(decode_attributes(&json).unwrap(), attrs);
  }
}
