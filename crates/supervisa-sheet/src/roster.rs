//! Roster import and the "available locations" export.

use std::io::Write;

use supervisa_core::roster::{AnnotatedRosterEntry, RosterEntry};

use crate::{
  error::Result,
  normalize::location_code,
  table::RawTable,
};

/// Key column of the roster spreadsheet.
pub const CODE_COLUMN: &str = "Código interno";
/// Status column appended on export.
pub const STATUS_COLUMN: &str = "Estado_Supervision";

/// Build roster entries from `table`. Every column other than the code is
/// kept as an attribute, in sheet order; rows without a code are skipped.
pub fn roster_from_table(table: &RawTable) -> Result<Vec<RosterEntry>> {
  let code_col = table.require_column(&[CODE_COLUMN], "roster")?;

  let entries = table
    .rows
    .iter()
    .map(|row| {
      let mut entry = RosterEntry::new(location_code(RawTable::cell(row, code_col)));
      for (col, name) in table.headers.iter().enumerate() {
        if col != code_col {
          entry = entry.with_attribute(name.clone(), RawTable::cell(row, col).to_text());
        }
      }
      entry
    })
    .filter(|e| !e.location_code.is_empty())
    .collect();

  Ok(entries)
}

/// Write `entries` as CSV: the code column, every attribute column (in the
/// order first seen), then the status column.
pub fn write_roster_csv<'a, W: Write>(
  writer: W,
  entries: impl IntoIterator<Item = &'a AnnotatedRosterEntry>,
) -> Result<()> {
  let entries: Vec<&AnnotatedRosterEntry> = entries.into_iter().collect();

  let mut columns: Vec<&str> = Vec::new();
  for a in &entries {
    for (name, _) in &a.entry.attributes {
      if !columns.contains(&name.as_str()) {
        columns.push(name);
      }
    }
  }

  let mut out = csv::Writer::from_writer(writer);

  let mut header = vec![CODE_COLUMN];
  header.extend(&columns);
  header.push(STATUS_COLUMN);
  out.write_record(&header)?;

  for a in entries {
    let mut record = vec![a.entry.location_code.as_str()];
    record.extend(columns.iter().map(|c| a.entry.attribute(c).unwrap_or("")));
    record.push(a.status.as_str());
    out.write_record(&record)?;
  }

  out.flush()?;
  Ok(())
}
