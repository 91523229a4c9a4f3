//! Reading the client-supplied approval list.

use supervisa_core::reconcile::AuthorityEntry;

use crate::{
  error::Result,
  normalize::location_code,
  table::RawTable,
};

pub const CODE_COLUMN: &str = "Codigo_Interno";
pub const STATUS_COLUMN: &str = "Estado_Supervision";

/// Extract authority entries from `table`. Rows with an empty code are
/// skipped; statuses are kept as written.
pub fn authority_from_table(table: &RawTable) -> Result<Vec<AuthorityEntry>> {
  let code_col = table.require_column(&[CODE_COLUMN], "authority list")?;
  let status_col = table.require_column(&[STATUS_COLUMN], "authority list")?;

  Ok(
    table
      .rows
      .iter()
      .map(|row| {
        AuthorityEntry::new(
          location_code(RawTable::cell(row, code_col)),
          RawTable::cell(row, status_col).to_text(),
        )
      })
      .filter(|entry| !entry.location_code.is_empty())
      .collect(),
  )
}
