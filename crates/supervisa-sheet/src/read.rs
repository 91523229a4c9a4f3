//! File readers: spreadsheets through calamine, delimited text through csv.

use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto};
use tracing::debug;

use crate::{
  error::{Error, Result},
  table::{Cell, RawTable},
};

/// Read the first sheet of a workbook, or a delimited text file, choosing the
/// reader by file extension.
pub fn read_table(path: &Path) -> Result<RawTable> {
  let ext = path
    .extension()
    .and_then(|e| e.to_str())
    .map(|e| e.to_ascii_lowercase())
    .unwrap_or_default();

  match ext.as_str() {
    "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_workbook(path),
    "csv" | "tsv" | "txt" => read_delimited(path),
    _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
  }
}

// ─── Workbooks ───────────────────────────────────────────────────────────────

pub fn read_workbook(path: &Path) -> Result<RawTable> {
  let mut workbook: Sheets<_> = open_workbook_auto(path)?;
  let Some(first) = workbook.sheet_names().first().cloned() else {
    return Err(Error::EmptyWorkbook(path.to_path_buf()));
  };
  let range = workbook.worksheet_range(&first)?;

  let grid: Vec<Vec<Cell>> = range
    .rows()
    .map(|row| row.iter().map(cell_from_data).collect())
    .collect();

  let table = RawTable::from_grid(grid);
  debug!(
    path = %path.display(),
    sheet = %first,
    rows = table.rows.len(),
    "read workbook"
  );
  Ok(table)
}

fn cell_from_data(data: &Data) -> Cell {
  match data {
    Data::Empty => Cell::Empty,
    Data::String(s) => Cell::Text(s.clone()),
    Data::Float(n) => Cell::Number(*n),
    Data::Int(n) => Cell::Number(*n as f64),
    Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_owned()),
    Data::Error(e) => Cell::Text(format!("#{e:?}")),
    Data::DateTime(dt) => Cell::Date(dt.as_f64()),
    Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
  }
}

// ─── Delimited text ──────────────────────────────────────────────────────────

pub fn read_delimited(path: &Path) -> Result<RawTable> {
  let bytes = std::fs::read(path)?;
  let content = decode_text(bytes);
  let table = parse_delimited(&content)?;
  debug!(path = %path.display(), rows = table.rows.len(), "read delimited file");
  Ok(table)
}

/// UTF-8 when valid, otherwise Windows-1252 (the usual encoding of
/// spreadsheet CSV exports).
fn decode_text(bytes: Vec<u8>) -> String {
  match String::from_utf8(bytes) {
    Ok(s) => s.strip_prefix('\u{feff}').map(str::to_owned).unwrap_or(s),
    Err(e) => {
      let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
      decoded.into_owned()
    }
  }
}

/// Parse delimited text with a sniffed delimiter. Every field is text; type
/// interpretation is left to the normalizer.
pub fn parse_delimited(content: &str) -> Result<RawTable> {
  let mut reader = csv::ReaderBuilder::new()
    .delimiter(sniff_delimiter(content))
    .has_headers(false)
    .flexible(true)
    .from_reader(content.as_bytes());

  let mut grid = Vec::new();
  for record in reader.records() {
    let record = record?;
    grid.push(
      record
        .iter()
        .map(|f| if f.is_empty() { Cell::Empty } else { Cell::Text(f.to_owned()) })
        .collect(),
    );
  }
  Ok(RawTable::from_grid(grid))
}

/// Pick the candidate delimiter that yields the most consistent field count
/// (greater than one) over the first lines.
fn sniff_delimiter(content: &str) -> u8 {
  let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
  let sample: Vec<&str> = content.lines().take(10).collect();

  let mut best = b',';
  let mut best_score = 0usize;

  for &delim in candidates {
    let counts: Vec<usize> = sample
      .iter()
      .map(|line| {
        csv::ReaderBuilder::new()
          .delimiter(delim)
          .has_headers(false)
          .flexible(true)
          .from_reader(line.as_bytes())
          .records()
          .next()
          .and_then(|r| r.ok())
          .map(|r| r.len())
          .unwrap_or(1)
      })
      .collect();

    let Some(&target) = counts.first() else { continue };
    if target <= 1 {
      continue;
    }
    let score = counts.iter().filter(|&&c| c == target).count() * target;
    if score > best_score {
      best_score = score;
      best = delim;
    }
  }

  best
}
