//! SQL schema for the comport SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS extractors (
    extractor_id  TEXT PRIMARY KEY,
    department_id INTEGER NOT NULL,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL,   -- ISO 8601 UTC
    last_contact  TEXT,            -- ISO 8601 UTC or NULL
    next_month    INTEGER,         -- backfill checkpoint; both NULL when unset
    next_year     INTEGER
);

-- One row per stored incident of any kind. The typed record lives in
-- record_json; natural_key is the canonical JSON of its key fields.
CREATE TABLE IF NOT EXISTS incidents (
    incident_id   TEXT PRIMARY KEY,
    kind          TEXT NOT NULL,   -- 'use_of_force' | 'officer_involved_shooting' | 'citizen_complaint'
    department_id INTEGER NOT NULL,
    natural_key   TEXT NOT NULL,
    opaque_id     TEXT NOT NULL,
    occured_date  TEXT NOT NULL,   -- YYYY-MM-DD
    record_json   TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    UNIQUE (kind, department_id, natural_key)
);

CREATE INDEX IF NOT EXISTS incidents_department_idx ON incidents(kind, department_id);
CREATE INDEX IF NOT EXISTS incidents_opaque_idx     ON incidents(department_id, opaque_id);
CREATE INDEX IF NOT EXISTS incidents_date_idx       ON incidents(occured_date);

PRAGMA user_version = 1;
";
