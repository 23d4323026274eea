//! SQL schema for the CEP SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS areas (
    area_id     TEXT PRIMARY KEY,
    code        TEXT NOT NULL UNIQUE,   -- 3-4 uppercase letters, never renamed
    name        TEXT NOT NULL,
    description TEXT,
    color       TEXT,
    active      INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL
);

-- The UNIQUE code column is what turns a sequencing race between two
-- writers into a detectable error instead of a silent duplicate.
CREATE TABLE IF NOT EXISTS courses (
    course_id          TEXT PRIMARY KEY,
    code               TEXT NOT NULL UNIQUE,   -- {AREA}-{CATEGORY}-{NNNN}
    name               TEXT NOT NULL,
    area_id            TEXT NOT NULL REFERENCES areas(area_id),
    category           TEXT NOT NULL,          -- 'privados' | 'ocupados' | ...
    short_description  TEXT NOT NULL DEFAULT '',
    duration_hours     INTEGER,
    base_price         REAL,
    subsidy_percentage INTEGER NOT NULL DEFAULT 100,
    modality           TEXT NOT NULL DEFAULT 'presencial',
    active             INTEGER NOT NULL DEFAULT 1,
    featured           INTEGER NOT NULL DEFAULT 0,
    created_by         TEXT,
    created_at         TEXT NOT NULL,          -- RFC 3339, fixed microseconds
    slug               TEXT NOT NULL UNIQUE    -- derived from name at creation
);

CREATE TABLE IF NOT EXISTS staff (
    staff_id   TEXT PRIMARY KEY,
    staff_type TEXT NOT NULL,                  -- 'profesor' | 'administrativo'
    first_name TEXT NOT NULL,
    last_name  TEXT NOT NULL,
    full_name  TEXT NOT NULL,
    email      TEXT NOT NULL UNIQUE,
    phone      TEXT,
    bio        TEXT,
    position   TEXT NOT NULL,
    is_active  INTEGER NOT NULL DEFAULT 1,
    notes      TEXT,
    created_by TEXT,                           -- written on INSERT only
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS courses_area_idx    ON courses(area_id);
CREATE INDEX IF NOT EXISTS courses_created_idx ON courses(created_at);
CREATE INDEX IF NOT EXISTS staff_type_idx      ON staff(staff_type, is_active);

PRAGMA user_version = 1;
";
