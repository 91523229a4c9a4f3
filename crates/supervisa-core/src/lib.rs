//! Core types and reconciliation logic for the supervision ledger.
//!
//! This crate is deliberately free of spreadsheet and database dependencies.
//! The sheet codec, the SQLite backend and the CLI all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod reconcile;
pub mod record;
pub mod reference;
pub mod report;
pub mod roster;
pub mod store;

pub use error::{Error, Result};
