//! Error types for the supervisa-sheet codec.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown source kind: {0:?}")]
  UnknownSourceKind(String),

  #[error("column {column:?} not found in {kind} input")]
  MissingColumn { kind: String, column: String },

  #[error("unsupported file format: {0}")]
  UnsupportedFormat(PathBuf),

  #[error("workbook has no sheets: {0}")]
  EmptyWorkbook(PathBuf),

  #[error("workbook error: {0}")]
  Workbook(#[from] calamine::Error),

  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
