//! Integration tests for `SqliteStore` against in-memory and on-disk databases.

use std::{
  collections::{HashSet, VecDeque},
  path::PathBuf,
  sync::Mutex,
};

use subkit_core::{
  allocator::{IdAllocator, MAX_DRAWS},
  store::SubscriberStore,
  subscriber::Deletion,
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// Replays a fixed id sequence, then falls back to random ids.
struct ScriptedAllocator(Mutex<VecDeque<Uuid>>);

impl IdAllocator for ScriptedAllocator {
  fn allocate(&self) -> Uuid {
    self
      .0
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(Uuid::new_v4)
  }
}

/// A database path under the system temp dir, removed on drop.
struct TempDb(PathBuf);

impl TempDb {
  fn new() -> Self {
    Self(std::env::temp_dir().join(format!("subkit-test-{}.db", Uuid::new_v4())))
  }
}

impl Drop for TempDb {
  fn drop(&mut self) {
    for suffix in ["", "-wal", "-shm"] {
      let mut p = self.0.clone().into_os_string();
      p.push(suffix);
      let _ = std::fs::remove_file(p);
    }
  }
}

// ─── Create / get ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get() {
  let s = store().await;

  let created = s.create("alice".into()).await.unwrap();
  assert_eq!(created.label, "alice");

  let fetched = s.get(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn empty_label_round_trips_verbatim() {
  let s = store().await;
  let created = s.create(String::new()).await.unwrap();
  let fetched = s.get(created.id).await.unwrap().unwrap();
  assert_eq!(fetched.label, "");
}

// ─── List ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_is_insertion_ordered() {
  let s = store().await;
  let a = s.create("a".into()).await.unwrap();
  let b = s.create("b".into()).await.unwrap();
  let c = s.create("c".into()).await.unwrap();

  let ids: Vec<Uuid> = s.list().await.unwrap().iter().map(|x| x.id).collect();
  assert_eq!(ids, vec![a.id, b.id, c.id]);
}

#[tokio::test]
async fn list_size_tracks_creates_minus_deletes() {
  let s = store().await;
  let mut ids = Vec::new();
  for i in 0..5 {
    ids.push(s.create(format!("user-{i}")).await.unwrap().id);
  }
  s.delete(ids[1]).await.unwrap();
  s.delete(ids[3]).await.unwrap();
  // A second delete of the same id is not a successful delete.
  assert_eq!(s.delete(ids[3]).await.unwrap(), Deletion::NotFound);

  let listed: Vec<Uuid> = s.list().await.unwrap().iter().map(|x| x.id).collect();
  assert_eq!(listed, vec![ids[0], ids[2], ids[4]]);
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_is_permanent() {
  let s = store().await;
  let created = s.create("bob".into()).await.unwrap();

  assert_eq!(s.delete(created.id).await.unwrap(), Deletion::Deleted);
  for i in 0..3 {
    s.create(format!("later-{i}")).await.unwrap();
  }
  assert!(s.get(created.id).await.unwrap().is_none());
  assert_eq!(s.delete(created.id).await.unwrap(), Deletion::NotFound);
}

#[tokio::test]
async fn delete_missing_returns_not_found() {
  let s = store().await;
  assert_eq!(s.delete(Uuid::new_v4()).await.unwrap(), Deletion::NotFound);
}

// ─── Identity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn retired_and_live_ids_are_skipped() {
  let first  = Uuid::new_v4();
  let second = Uuid::new_v4();
  let s = store()
    .await
    .with_allocator(ScriptedAllocator(Mutex::new(VecDeque::from([
      first,
      second,
      first,
      Uuid::nil(),
      second,
    ]))));

  assert_eq!(s.create("a".into()).await.unwrap().id, first);
  assert_eq!(s.create("b".into()).await.unwrap().id, second);
  s.delete(first).await.unwrap();

  // The allocator replays `first` (retired), nil and `second` (live).
  let c = s.create("c".into()).await.unwrap();
  assert!(![first, second, Uuid::nil()].contains(&c.id));
}

#[tokio::test]
async fn stuck_allocator_gives_up_instead_of_spinning() {
  let taken = Uuid::new_v4();
  let s = store()
    .await
    .with_allocator(ScriptedAllocator(Mutex::new(
      std::iter::repeat_n(taken, MAX_DRAWS + 1).collect(),
    )));
  assert_eq!(s.create("a".into()).await.unwrap().id, taken);

  let err = s.create("b".into()).await.unwrap_err();
  assert!(matches!(err, Error::AllocatorExhausted(MAX_DRAWS)), "{err}");
  assert_eq!(s.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_creates_get_distinct_ids() {
  let s = store().await;
  let (a, b) = tokio::join!(s.create("a".into()), s.create("b".into()));
  let (a, b) = (a.unwrap(), b.unwrap());
  assert_ne!(a.id, b.id);

  let listed: HashSet<Uuid> = s.list().await.unwrap().iter().map(|x| x.id).collect();
  assert_eq!(listed, HashSet::from([a.id, b.id]));
}

// ─── Durability ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn records_and_retired_ids_survive_reopen() {
  let db = TempDb::new();

  let (kept, gone) = {
    let s = SqliteStore::open(&db.0).await.unwrap();
    let kept = s.create("kept".into()).await.unwrap();
    let gone = s.create("gone".into()).await.unwrap();
    s.delete(gone.id).await.unwrap();
    (kept, gone)
  };

  let s = SqliteStore::open(&db.0)
    .await
    .unwrap()
    .with_allocator(ScriptedAllocator(Mutex::new(VecDeque::from([gone.id]))));

  assert_eq!(s.get(kept.id).await.unwrap(), Some(kept.clone()));
  assert!(s.get(gone.id).await.unwrap().is_none());

  let fresh = s.create("fresh".into()).await.unwrap();
  assert_ne!(fresh.id, gone.id);

  let labels: Vec<String> = s.list().await.unwrap().into_iter().map(|x| x.label).collect();
  assert_eq!(labels, vec!["kept", "fresh"]);
}
