//! The in-memory grid every reader produces.

use chrono::{Days, NaiveDate};

use crate::error::{Error, Result};

/// A single cell value, reduced to what the normalizer cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
  Empty,
  Text(String),
  Number(f64),
  /// A spreadsheet date, as a serial day count in the 1900 date system.
  Date(f64),
}

impl Cell {
  pub fn is_empty(&self) -> bool {
    match self {
      Self::Empty => true,
      Self::Text(s) => s.trim().is_empty(),
      _ => false,
    }
  }

  /// Render the cell as text. Integral numbers carry no fractional part and
  /// dates are written as `YYYY-MM-DD`.
  pub fn to_text(&self) -> String {
    match self {
      Self::Empty => String::new(),
      Self::Text(s) => s.trim().to_owned(),
      Self::Number(n) => format_number(*n),
      Self::Date(serial) => match serial_to_date(*serial) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => format_number(*serial),
      },
    }
  }
}

fn format_number(n: f64) -> String {
  if n.fract() == 0.0 && n.abs() < 1e15 {
    format!("{}", n as i64)
  } else {
    format!("{n}")
  }
}

/// Convert a spreadsheet serial day number to a date. The fractional part
/// (time of day) is discarded.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
  if !serial.is_finite() || serial < 1.0 {
    return None;
  }
  // Serial 1 is 1900-01-01; anchoring at 1899-12-30 absorbs the phantom
  // 1900-02-29 for every date after February 1900.
  let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
  epoch.checked_add_days(Days::new(serial.floor() as u64))
}

/// A header row plus data rows. Rows may be shorter than the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
  pub headers:     Vec<String>,
  pub rows:        Vec<Vec<Cell>>,
  /// 1-based line in the source sheet of each entry in `rows`. Empty for
  /// tables built by hand.
  pub source_rows: Vec<usize>,
}

impl RawTable {
  /// Build a table from a grid whose first row is the header. Fully empty
  /// rows are skipped.
  pub fn from_grid(mut grid: Vec<Vec<Cell>>) -> Self {
    if grid.is_empty() {
      return Self::default();
    }
    let headers = grid.remove(0).iter().map(Cell::to_text).collect();
    let (source_rows, rows): (Vec<usize>, Vec<Vec<Cell>>) = grid
      .into_iter()
      .enumerate()
      .filter(|(_, row)| !row.iter().all(Cell::is_empty))
      // Line 1 is the header.
      .map(|(idx, row)| (idx + 2, row))
      .unzip();
    Self { headers, rows, source_rows }
  }

  /// Source line of data row `idx`. Hand-built tables count as if no row was
  /// skipped.
  pub fn source_row(&self, idx: usize) -> usize {
    self.source_rows.get(idx).copied().unwrap_or(idx + 2)
  }

  /// Index of the first header equal to `name` (surrounding whitespace
  /// ignored).
  pub fn column(&self, name: &str) -> Option<usize> {
    self.headers.iter().position(|h| h.trim() == name)
  }

  /// Index of the first header matching any of `names`, in preference order.
  pub fn column_any(&self, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| self.column(n))
  }

  /// Like [`Self::column_any`], failing with `MissingColumn` naming the first
  /// candidate.
  pub fn require_column(&self, names: &[&str], kind: &str) -> Result<usize> {
    self.column_any(names).ok_or_else(|| Error::MissingColumn {
      kind:   kind.to_owned(),
      column: names.first().copied().unwrap_or_default().to_owned(),
    })
  }

  /// The cell at `(row, col)`, `Empty` when the row is short.
  pub fn cell<'a>(row: &'a [Cell], col: usize) -> &'a Cell {
    const EMPTY: &Cell = &Cell::Empty;
    row.get(col).unwrap_or(EMPTY)
  }
}
