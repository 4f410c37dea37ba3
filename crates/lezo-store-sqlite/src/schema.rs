//! SQL schema for the Lezo SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Citizens are never deleted; status is the only lifecycle.
CREATE TABLE IF NOT EXISTS citizens (
    citizen_id     TEXT PRIMARY KEY,
    created_at     TEXT NOT NULL,   -- RFC 3339 UTC; server-assigned
    last_name      TEXT NOT NULL,
    first_name     TEXT NOT NULL,
    middle_name    TEXT,
    suffix         TEXT,
    address        TEXT,
    precinct       TEXT NOT NULL,
    legend         TEXT,
    sex            TEXT,            -- 'M' | 'F'
    birthday       TEXT,            -- YYYY-MM-DD
    place_of_birth TEXT,
    civil_status   TEXT,
    tin            TEXT,
    philhealth_no  TEXT,
    email          TEXT,
    status         TEXT NOT NULL DEFAULT 'active',
    region         TEXT NOT NULL    -- sheet label, e.g. 'Sta. Cruz'
);

-- Dedup keys. A known birthday makes the name unique municipality-wide;
-- without one the name is only unique inside its region.
CREATE UNIQUE INDEX IF NOT EXISTS citizens_name_birthday_key
    ON citizens(last_name, first_name, birthday) WHERE birthday IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS citizens_name_region_key
    ON citizens(last_name, first_name, region) WHERE birthday IS NULL;

CREATE INDEX IF NOT EXISTS citizens_region_name_idx   ON citizens(region, last_name, first_name);
CREATE INDEX IF NOT EXISTS citizens_region_status_idx ON citizens(region, status);
CREATE INDEX IF NOT EXISTS citizens_tin_idx           ON citizens(tin) WHERE tin IS NOT NULL;
CREATE INDEX IF NOT EXISTS citizens_philhealth_idx    ON citizens(philhealth_no) WHERE philhealth_no IS NOT NULL;

-- Kin edges: \"source is <kind> of target\". Insert-only.
CREATE TABLE IF NOT EXISTS relationships (
    relationship_id TEXT PRIMARY KEY,
    source_id       TEXT NOT NULL REFERENCES citizens(citizen_id),
    target_id       TEXT NOT NULL REFERENCES citizens(citizen_id),
    kind            TEXT NOT NULL,
    recorded_at     TEXT NOT NULL,
    UNIQUE (source_id, target_id, kind),
    CHECK  (source_id != target_id)
);

CREATE INDEX IF NOT EXISTS relationships_source_idx ON relationships(source_id, kind);
CREATE INDEX IF NOT EXISTS relationships_target_idx ON relationships(target_id, kind);

PRAGMA user_version = 1;
";
