//! SQL schema for the daypick SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per identity-provider user, upserted on every login.
CREATE TABLE IF NOT EXISTS identities (
    external_id       TEXT PRIMARY KEY,
    display_name      TEXT,
    email             TEXT,
    profile_image_url TEXT,
    access_token      TEXT NOT NULL,
    refresh_token     TEXT NOT NULL,
    created_at        TEXT NOT NULL    -- ISO 8601 UTC; kept across upserts
);

-- owner_id is a loose reference to identities(external_id); no FOREIGN KEY.
CREATE TABLE IF NOT EXISTS daily_picks (
    pick_id            TEXT PRIMARY KEY,
    owner_id           TEXT NOT NULL,
    day                TEXT NOT NULL,  -- YYYY-MM-DD bucket of submitted_at (UTC)
    track_ref          TEXT NOT NULL,
    title              TEXT NOT NULL,
    artists            TEXT NOT NULL,  -- JSON array of names, in order
    cover_url          TEXT NOT NULL,
    owner_display_name TEXT NOT NULL,  -- snapshot at submission time
    submitted_at       TEXT NOT NULL,  -- ISO 8601 UTC, fixed-width micros
    UNIQUE (owner_id, day)
);

CREATE TABLE IF NOT EXISTS pick_likes (
    pick_id TEXT NOT NULL REFERENCES daily_picks(pick_id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    PRIMARY KEY (pick_id, user_id)
);

CREATE INDEX IF NOT EXISTS daily_picks_track_idx ON daily_picks(track_ref);

PRAGMA user_version = 1;
";
