//! SQL schema for the supervisa SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- The three ledger tables share one layout. `position` preserves insertion
-- order; it is dense from 0 after a replace and grows on append.
CREATE TABLE IF NOT EXISTS ledger_main (
    position           INTEGER NOT NULL PRIMARY KEY,
    date               TEXT    NOT NULL,   -- YYYY-MM-DD
    location_code      TEXT    NOT NULL,
    region             TEXT    NOT NULL,
    supervisor_name    TEXT    NOT NULL,
    supervision_status TEXT    NOT NULL,   -- 'Fiscalizado' | 'Prefiscalizado'
    month_label        TEXT    NOT NULL,   -- Spanish month name
    inspection_kind    TEXT    NOT NULL,   -- 'Normal' | 'CMC'
    approved           INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS ledger_staging (
    position           INTEGER NOT NULL PRIMARY KEY,
    date               TEXT    NOT NULL,
    location_code      TEXT    NOT NULL,
    region             TEXT    NOT NULL,
    supervisor_name    TEXT    NOT NULL,
    supervision_status TEXT    NOT NULL,
    month_label        TEXT    NOT NULL,
    inspection_kind    TEXT    NOT NULL,
    approved           INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS ledger_flagged (
    position           INTEGER NOT NULL PRIMARY KEY,
    date               TEXT    NOT NULL,
    location_code      TEXT    NOT NULL,
    region             TEXT    NOT NULL,
    supervisor_name    TEXT    NOT NULL,
    supervision_status TEXT    NOT NULL,
    month_label        TEXT    NOT NULL,
    inspection_kind    TEXT    NOT NULL,
    approved           INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS ledger_main_code_idx    ON ledger_main(location_code);
CREATE INDEX IF NOT EXISTS ledger_staging_code_idx ON ledger_staging(location_code);
CREATE INDEX IF NOT EXISTS ledger_flagged_code_idx ON ledger_flagged(location_code);

-- Static location catalog. Non-key columns are kept as an ordered JSON array
-- of [name, value] pairs.
CREATE TABLE IF NOT EXISTS roster (
    position        INTEGER NOT NULL PRIMARY KEY,
    location_code   TEXT    NOT NULL,
    attributes_json TEXT    NOT NULL DEFAULT '[]'
);

PRAGMA user_version = 1;
";
