//! Spreadsheet and CSV codec for supervisa.
//!
//! Reads export files into a [`RawTable`], then converts tables into
//! [`supervisa_core`] domain values: supervision records, authority entries
//! and roster entries. Also writes roster CSV exports. Pure synchronous; no
//! database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use supervisa_core::reference::ReferenceData;
//! use supervisa_sheet::{Normalizer, SourceKind, read_table};
//!
//! let reference = ReferenceData::default();
//! let table = read_table(Path::new("fiscalizados.xlsx")).unwrap();
//! let out = Normalizer::new(&reference)
//!   .normalize(&table, SourceKind::Fiscalizados)
//!   .unwrap();
//! println!("{} records, {} dropped", out.records.len(), out.report.dropped_dates);
//! ```

pub mod authority;
pub mod error;
pub mod normalize;
pub mod read;
pub mod roster;
pub mod table;

pub use authority::authority_from_table;
pub use error::{Error, Result};
pub use normalize::{NormalizeOutput, NormalizeReport, Normalizer, SourceKind};
pub use read::read_table;
pub use roster::{roster_from_table, write_roster_csv};
pub use table::{Cell, RawTable};
