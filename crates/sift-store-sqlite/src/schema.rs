//! SQL schema for the Sift SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per (chat, sender) pair ever seen.
CREATE TABLE IF NOT EXISTS senders (
    chat_id    INTEGER NOT NULL,
    sender_id  INTEGER NOT NULL,
    last_day   TEXT NOT NULL,     -- YYYY-MM-DD in the configured offset
    last_month TEXT NOT NULL,     -- YYYY-MM
    PRIMARY KEY (chat_id, sender_id)
);

-- The sender's day and month membership sets, fully rewritten on save.
CREATE TABLE IF NOT EXISTS sender_scopes (
    chat_id   INTEGER NOT NULL,
    sender_id INTEGER NOT NULL,
    scope     TEXT NOT NULL,      -- 'day' | 'month'
    kind      TEXT NOT NULL,      -- 'phone' | 'handle'
    key       TEXT NOT NULL,
    PRIMARY KEY (chat_id, sender_id, scope, kind, key)
);

-- Lifetime history. Rows are only ever inserted or count-bumped; rollover
-- never deletes from this table.
CREATE TABLE IF NOT EXISTS history (
    kind          TEXT NOT NULL,
    key           TEXT NOT NULL,
    seen_count    INTEGER NOT NULL DEFAULT 1,
    first_seen_by INTEGER NOT NULL,
    PRIMARY KEY (kind, key)
);

-- Per-(sender, day) activity ledger served by the snapshot accessor.
CREATE TABLE IF NOT EXISTS activity (
    chat_id         INTEGER NOT NULL,
    sender_id       INTEGER NOT NULL,
    date            TEXT NOT NULL, -- YYYY-MM-DD
    new_count       INTEGER NOT NULL,
    duplicate_count INTEGER NOT NULL,
    day_total       INTEGER NOT NULL,
    month_total     INTEGER NOT NULL,
    PRIMARY KEY (chat_id, sender_id, date)
);

CREATE INDEX IF NOT EXISTS activity_date_idx ON activity(date);

PRAGMA user_version = 1;
";
