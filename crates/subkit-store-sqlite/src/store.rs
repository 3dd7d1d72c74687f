//! [`SqliteStore`]: the SQLite implementation of [`SubscriberStore`].

use std::{path::Path, sync::Arc};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use subkit_core::{
  allocator::{IdAllocator, MAX_DRAWS, RandomAllocator},
  store::SubscriberStore,
  subscriber::{Deletion, Subscriber},
};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawSubscriber, SUBSCRIBER_COLUMNS, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A subscriber store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:      tokio_rusqlite::Connection,
  allocator: Arc<dyn IdAllocator>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  /// Replace the id source. Retired and live ids are still never reissued.
  pub fn with_allocator(mut self, allocator: impl IdAllocator + 'static) -> Self {
    self.allocator = Arc::new(allocator);
    self
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, allocator: Arc::new(RandomAllocator) })
  }
}

// ─── SubscriberStore impl ────────────────────────────────────────────────────

impl SubscriberStore for SqliteStore {
  type Error = crate::Error;

  async fn create(&self, label: String) -> Result<Subscriber> {
    let allocator = Arc::clone(&self.allocator);
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let label_col = label.clone();

    // Draw, check and insert inside one transaction so no other writer can
    // claim the id in between.
    let id: Option<Uuid> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut chosen = None;
        for _ in 0..MAX_DRAWS {
          let candidate = allocator.allocate();
          if candidate.is_nil() {
            continue;
          }
          let id_str = encode_uuid(candidate);
          let taken: bool = tx
            .query_row(
              "SELECT 1 FROM subscribers WHERE id = ?1
               UNION ALL
               SELECT 1 FROM retired_ids WHERE id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if !taken {
            tx.execute(
              "INSERT INTO subscribers (id, label, created_at) VALUES (?1, ?2, ?3)",
              rusqlite::params![id_str, label_col, at_str],
            )?;
            chosen = Some(candidate);
            break;
          }
        }
        tx.commit()?;
        Ok(chosen)
      })
      .await?;
    let id = id.ok_or(Error::AllocatorExhausted(MAX_DRAWS))?;

    tracing::debug!(%id, "subscriber row inserted");
    Ok(Subscriber { id, label, created_at })
  }

  async fn get(&self, id: Uuid) -> Result<Option<Subscriber>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubscriber> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SUBSCRIBER_COLUMNS} FROM subscribers WHERE id = ?1"),
              rusqlite::params![id_str],
              RawSubscriber::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubscriber::into_subscriber).transpose()
  }

  async fn list(&self) -> Result<Vec<Subscriber>> {
    let raws: Vec<RawSubscriber> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers ORDER BY seq"
        ))?;
        let rows = stmt
          .query_map([], RawSubscriber::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscriber::into_subscriber).collect()
  }

  async fn delete(&self, id: Uuid) -> Result<Deletion> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let removed: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let removed = tx.execute(
          "DELETE FROM subscribers WHERE id = ?1",
          rusqlite::params![id_str],
        )? > 0;
        if removed {
          tx.execute(
            "INSERT OR IGNORE INTO retired_ids (id, retired_at) VALUES (?1, ?2)",
            rusqlite::params![id_str, at_str],
          )?;
        }
        tx.commit()?;
        Ok(removed)
      })
      .await?;

    if removed {
      tracing::debug!(%id, "subscriber row deleted, id retired");
      Ok(Deletion::Deleted)
    } else {
      Ok(Deletion::NotFound)
    }
  }
}
