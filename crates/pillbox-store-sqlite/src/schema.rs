//! SQL schema for the Pillbox SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS supplements (
    supplement_id TEXT PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE,
    default_unit  TEXT,
    created_at    TEXT NOT NULL
);

-- The template: what should be taken on any date in a given week bucket.
-- Written by an admin; never touched by the tracker.
CREATE TABLE IF NOT EXISTS schedule (
    item_id       TEXT PRIMARY KEY,
    week_number   INTEGER NOT NULL CHECK (week_number BETWEEN 1 AND 3),
    day_slot      TEXT NOT NULL CHECK (day_slot IN ('morning', 'midday', 'evening')),
    timing        TEXT NOT NULL,
    supplement_id TEXT NOT NULL REFERENCES supplements(supplement_id),
    dosage        REAL NOT NULL,
    notes         TEXT,
    created_at    TEXT NOT NULL,
    UNIQUE (week_number, day_slot, timing, supplement_id)
);

-- One row per scheduled dose per date, copied from the template on first
-- view. The UNIQUE constraint is what makes concurrent first views safe.
CREATE TABLE IF NOT EXISTS history (
    entry_id         TEXT PRIMARY KEY,
    taken_date       TEXT NOT NULL,    -- YYYY-MM-DD
    supplement_id    TEXT NOT NULL REFERENCES supplements(supplement_id),
    day_slot         TEXT NOT NULL CHECK (day_slot IN ('morning', 'midday', 'evening')),
    timing           TEXT NOT NULL,
    dosage_scheduled REAL NOT NULL,
    unit_scheduled   TEXT,
    taken            INTEGER NOT NULL DEFAULT 0,
    taken_at         TEXT,             -- RFC 3339 UTC; NULL unless taken
    created_at       TEXT NOT NULL,
    UNIQUE (taken_date, supplement_id, day_slot, timing)
);

CREATE INDEX IF NOT EXISTS schedule_week_idx ON schedule(week_number);
CREATE INDEX IF NOT EXISTS history_date_idx  ON history(taken_date);

PRAGMA user_version = 1;
";
