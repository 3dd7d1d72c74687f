//! SQL schema for the subkit SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- `seq` fixes list order to insertion order.
CREATE TABLE IF NOT EXISTS subscribers (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    id          TEXT    NOT NULL UNIQUE,
    label       TEXT    NOT NULL,
    created_at  TEXT    NOT NULL   -- ISO 8601 UTC; server-assigned
);

-- Every id ever deleted. Rows are never removed.
CREATE TABLE IF NOT EXISTS retired_ids (
    id          TEXT PRIMARY KEY,
    retired_at  TEXT NOT NULL
);

PRAGMA user_version = 1;
";
