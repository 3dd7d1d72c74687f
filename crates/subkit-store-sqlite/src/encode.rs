//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, Utc};
use subkit_core::subscriber::Subscriber;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawSubscriber::from_row`].
pub const SUBSCRIBER_COLUMNS: &str = "id, label, created_at";

/// Raw strings read directly from a `subscribers` row.
pub struct RawSubscriber {
  pub id:         String,
  pub label:      String,
  pub created_at: String,
}

impl RawSubscriber {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      label:      row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_subscriber(self) -> Result<Subscriber> {
    Ok(Subscriber {
      id:         decode_uuid(&self.id)?,
      label:      self.label,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
