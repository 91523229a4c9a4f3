//! Error types for `supervisa-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown supervision status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown inspection kind: {0:?}")]
  UnknownInspectionKind(String),

  #[error("unknown month: {0:?}")]
  UnknownMonth(String),

  #[error("goal row for {month} has {found} entries, expected one per region ({expected})")]
  GoalRowLength {
    month:    String,
    expected: usize,
    found:    usize,
  },

  #[error("alias {alias:?} maps to {target:?}, which is not a canonical region")]
  UnknownRegion { alias: String, target: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
